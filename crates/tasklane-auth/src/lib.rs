//! Tasklane Authentication
//!
//! This crate provides password hashing, the access/refresh token codec,
//! the session manager that enforces a single active refresh token per user,
//! and the request authenticator for Axum.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod session;
pub mod store;

pub use error::AuthError;
pub use jwt::{Claims, TokenCodec, TokenConfig, TokenKind};
pub use middleware::{AuthUser, auth_middleware, authenticate};
pub use password::{hash_password, verify_password};
pub use session::{AuthSession, PublicUser, SessionManager, TokenPair};
pub use store::IdentityStore;
