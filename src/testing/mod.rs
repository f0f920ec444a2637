//! Shared testing utilities
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built secrets, clocks, managers and users
//! - [`requests`] - HTTP request builders for testing handlers
//! - [`assertions`] - Assertion helpers for responses and cookies
//! - [`mock`] - Fake collaborators with call counters
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medscan::testing::{RequestBuilder, TestFixtures};
//!
//! let (manager, users) = TestFixtures::session_manager();
//! let token = manager.issue_token("user-1", None).unwrap();
//! let req = RequestBuilder::local().with_session(&token).build();
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock;
pub mod requests;

pub use assertions::*;
pub use fixtures::TestFixtures;
pub use requests::RequestBuilder;

/// Common test constants
pub mod constants {
    /// Signing secret used by every fixture (32 bytes)
    pub const TEST_SECRET: &[u8] = b"test_key_32_bytes_long_for_test_";

    /// Start of the manual clock: 2023-11-14T22:13:20Z
    pub const TEST_EPOCH: i64 = 1_700_000_000;

    pub const TEST_EMAIL: &str = "test@example.com";

    pub const TEST_PASSWORD: &str = "correct horse battery staple";

    pub const TEST_USER_NAME: &str = "Test User";

    pub const LOCAL_HOST: &str = "localhost:3000";

    pub const PUBLIC_HOST: &str = "review.example.com";
}
