pub mod cookies;
pub mod token;

pub use cookies::SessionCookies;
pub use token::{AuthError, Claims, TokenIssuer};

/// The authenticated identity attached to a request after admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
}
