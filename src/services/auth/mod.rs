pub mod factory;
pub mod identity;
pub mod service;
pub mod session;

pub use factory::build_auth_service;
pub use identity::Identity;
pub use service::{AuthError, AuthService, token_fingerprint};
pub use session::{SessionError, SessionVerifier, SupabaseSessionVerifier};
