pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh_tokens;

pub use extractor::CurrentUser;
pub use middleware::{require_admin, require_auth};
