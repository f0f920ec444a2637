#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the medscan application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod authentication;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod notification;
pub mod session;
pub mod settings;
pub mod users;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use authentication::{require_admin, require_user, AuthenticationServiceFactory};
pub use handlers::configure_services;
pub use models::{Role, User};
pub use session::{SessionError, SessionManager};
pub use settings::MedscanSettings;
