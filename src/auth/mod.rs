//! Authentication of the user making a request.

mod claims;
mod user;

pub use claims::{AuthError, Claims, JwtKeys, issue_token};
pub use user::UserID;
