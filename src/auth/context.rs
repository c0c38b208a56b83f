use uuid::Uuid;

use super::Claims;
use crate::domain::users::UserRole;
use crate::error::{ApiError, ApiResult};

/// Verified token identity, before any database lookup
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub issuer: String,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            issuer: claims.iss.clone(),
        })
    }
}

/// An onboarded, active marketplace user
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub is_active: bool,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Fails with 403 unless the user holds `role`.
    pub fn require(&self, role: UserRole) -> ApiResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!("Only {} accounts can do this", role)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            iss: "bell24h".to_string(),
            iat: None,
            exp: 0,
            nbf: None,
            email: Some("buyer@example.com".to_string()),
        }
    }

    #[test]
    fn context_requires_uuid_subject() {
        assert!(AuthContext::from_claims(&claims("not-a-uuid")).is_err());

        let id = Uuid::new_v4();
        let ctx = AuthContext::from_claims(&claims(&id.to_string())).unwrap();
        assert_eq!(ctx.user_id, id);
        assert_eq!(ctx.email.as_deref(), Some("buyer@example.com"));
    }

    #[test]
    fn require_role_rejects_other_roles() {
        let user = CurrentUser {
            id: Uuid::new_v4(),
            email: "s@example.com".into(),
            name: "Steel Works".into(),
            role: UserRole::Supplier,
            is_active: true,
        };

        assert!(user.require(UserRole::Supplier).is_ok());
        let err = user.require(UserRole::Buyer).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
        assert!(!user.is_admin());
    }
}
