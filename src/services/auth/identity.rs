/*
 * Responsibility
 * - The caller identity every authenticated handler sees
 * - Either a verified end user or the shared-secret service caller
 */
use serde::Serialize;
use uuid::Uuid;

pub const SERVICE_ROLE: &str = "service_role";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub role: String,
}

impl Identity {
    pub fn user(id: Uuid, role: impl Into<String>) -> Self {
        Self {
            id,
            role: role.into(),
        }
    }

    pub fn service(id: Uuid) -> Self {
        Self {
            id,
            role: SERVICE_ROLE.to_string(),
        }
    }

    pub fn is_service(&self) -> bool {
        self.role == SERVICE_ROLE
    }
}
