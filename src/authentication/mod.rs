//! Authentication module for service wiring, collaborator traits and the authorization gate
//!
//! # Modules
//!
//! - [`factory`] - Builds runtime services from settings
//! - [`gate`] - `require_user` / `require_admin` checks for handlers
//! - [`traits`] - Collaborators consumed by the session manager

pub mod factory;
pub mod gate;
pub mod traits;

pub use factory::{AuthenticationServiceFactory, AuthenticationServices};
pub use gate::{require_admin, require_user};
pub use traits::{RemoteUserInfo, UserRepository};
