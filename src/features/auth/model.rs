use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_ADMIN, ROLE_EDITOR, ROLE_SUPER_ADMIN};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(ROLE_SUPER_ADMIN)
    }

    /// Admins manage taxonomy and the media library
    pub fn has_admin_access(&self) -> bool {
        self.is_super_admin() || self.has_role(ROLE_ADMIN)
    }

    /// Editors may read admin views but not change the taxonomy
    pub fn has_editor_access(&self) -> bool {
        self.has_admin_access() || self.has_role(ROLE_EDITOR)
    }
}

/// Claims carried by admin session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: u64,
    pub iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl From<SessionClaims> for AuthenticatedUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            sub: claims.sub,
            email: claims.email,
            roles: claims.roles,
        }
    }
}
