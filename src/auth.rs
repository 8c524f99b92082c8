//! Authentication collaborator seam.
//!
//! Token issuance and verification live in the HTTP layer; this core only
//! needs the resolved caller. The risk pipeline requires an authenticated
//! patient; the marker pipeline is open to any caller (a documented gap in
//! the upstream service, kept as-is rather than silently tightened).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::enums::Role;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No authenticated principal on this request")]
    Unauthenticated,

    #[error("Principal {0} lacks the {1} role")]
    Forbidden(Uuid, &'static str),
}

/// The resolved caller of a pipeline operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn patient(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Patient,
        }
    }
}

/// Resolves the calling principal from whatever credential the transport
/// carries. Implemented by the HTTP layer; tests use a fixed stub.
pub trait Authenticator: Send + Sync {
    fn identify(&self, credential: Option<&str>) -> Result<Principal, AuthError>;
}

/// Reject the request when the transport attached no principal.
pub fn require_principal(principal: Option<&Principal>) -> Result<&Principal, AuthError> {
    principal.ok_or(AuthError::Unauthenticated)
}
