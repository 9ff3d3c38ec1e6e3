//! User, role and token claim types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppError,
    repository::{Collection, Document},
};

/// Profile of a signed-in user, keyed by the identity provider uid
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Set when the user works as an operator
    pub operator_id: Option<String>,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl Document for UserProfile {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Marks a uid as administrator
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminRecord {
    pub id: String,
    pub email: Option<String>,
    pub granted_at: DateTime<Utc>,
}

impl Document for AdminRecord {
    const COLLECTION: Collection = Collection::Admins;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Create or replace a user profile (admin only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertUserProfile {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub operator_id: Option<String>,
    pub active: Option<bool>,
}

/// Role resolved for an authenticated uid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
    Admin,
    Operator { operator_id: String },
}

/// Authenticated and authorized caller
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Principal {
    pub uid: String,
    pub email: Option<String>,
    #[serde(flatten)]
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Operator code of the caller, if it is an operator
    pub fn operator_id(&self) -> Option<&str> {
        match &self.role {
            Role::Operator { operator_id } => Some(operator_id),
            Role::Admin => None,
        }
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Admins act on anyone's records, operators only on their own
    pub fn require_admin_or_operator(&self, operator_id: &str) -> Result<(), AppError> {
        if self.is_admin() || self.operator_id() == Some(operator_id) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Only the assigned operator or an administrator may do this".to_string(),
            ))
        }
    }
}

/// JWT claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}
