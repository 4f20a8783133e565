//! Admin authentication.
//!
//! The admin dashboard signs in against the site's identity provider, which issues
//! HS256 session tokens signed with `AUTH_JWT_SECRET`. This feature only validates
//! those tokens and exposes role guards; it does not mint them.

mod validator;

pub mod guards;
pub mod model;

pub use validator::JwtValidator;
