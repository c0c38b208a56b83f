pub mod claims;
pub mod context;
pub mod middleware;
pub mod tokens;

pub use claims::Claims;
pub use context::{AuthContext, CurrentUser};
pub use middleware::{RequireAuth, RequireUser};
pub use tokens::TokenVerifier;
