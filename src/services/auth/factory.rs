/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{AuthService, SupabaseSessionVerifier};
use crate::services::supabase::SupabaseClient;

pub fn build_auth_service(config: &Config, client: SupabaseClient) -> Arc<AuthService> {
    let verifier = Arc::new(SupabaseSessionVerifier::new(client));

    Arc::new(AuthService::new(
        config.supabase.service_key.clone(),
        config.service_role_user_id,
        verifier,
    ))
}
