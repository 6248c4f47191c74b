/// User model and database operations
///
/// Accounts carry a role for authorization, an Argon2id password hash, and
/// the password-reset state (hash of the emailed token plus its expiry).
/// Deactivation is a soft delete: `active = false` hides the row from every
/// default read but keeps the record.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     photo VARCHAR(255) NOT NULL DEFAULT 'default.jpg',
///     role user_role NOT NULL DEFAULT 'user',
///     password_hash VARCHAR(255) NOT NULL,
///     password_changed_at TIMESTAMPTZ,
///     password_reset_token VARCHAR(64),
///     password_reset_expires TIMESTAMPTZ,
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::store::{Resource, SqlValue, WriteColumns};

/// Account role driving route-level authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,
    LeadGuide,
    Guide,
    User,
}

impl Role {
    /// Database/wire label for this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::LeadGuide => "lead-guide",
            Role::Guide => "guide",
            Role::User => "user",
        }
    }
}

/// User account row
///
/// Credential and reset-token fields are not serializable at all, so they
/// cannot leak through any response path, including field projection.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,

    /// Stored lowercase; unique
    pub email: String,

    /// Profile photo filename
    pub photo: String,

    pub role: Role,

    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Backdated one second on every password change so tokens minted in the
    /// same second still compare as stale
    #[serde(skip_serializing)]
    pub password_changed_at: Option<DateTime<Utc>>,

    /// SHA-256 hex of the emailed reset token
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,

    #[serde(skip_serializing)]
    pub password_reset_expires: Option<DateTime<Utc>>,

    #[serde(skip_serializing)]
    pub active: bool,

    pub created_at: DateTime<Utc>,
}

impl Resource for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = "id, name, email, photo, role, password_hash, \
         password_changed_at, password_reset_token, password_reset_expires, active, created_at";
    const DEFAULT_FILTER: Option<&'static str> = Some("active");
    const FILTERABLE: &'static [&'static str] = &["name", "email", "role"];
    const SORTABLE: &'static [&'static str] = &["name", "email", "created_at"];
    const ENUM_COLUMNS: &'static [(&'static str, &'static str)] = &[("role", "user_role")];
    type Row = User;
}

/// Partial update for an account's profile fields
///
/// Only non-None fields are written. Role changes are reserved for the
/// admin routes; the self-service handler never populates it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    pub photo: Option<String>,

    pub role: Option<Role>,
}

impl WriteColumns for UpdateUser {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        if let Some(name) = &self.name {
            cols.push(("name", SqlValue::Text(name.clone())));
        }
        if let Some(email) = &self.email {
            cols.push(("email", SqlValue::Text(email.to_lowercase())));
        }
        if let Some(photo) = &self.photo {
            cols.push(("photo", SqlValue::Text(photo.clone())));
        }
        if let Some(role) = self.role {
            cols.push(("role", SqlValue::Enum("user_role", role.as_str().to_string())));
        }
        cols
    }
}

impl User {
    /// Creates a new account with the default role
    ///
    /// `password_hash` must already be an Argon2id hash; this function never
    /// sees a plaintext password. The email is stored lowercase.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, LOWER($2), $3)
            RETURNING id, name, email, photo, role, password_hash,
                      password_changed_at, password_reset_token, password_reset_expires,
                      active, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }

    /// Finds an active account by email (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, photo, role, password_hash,
                   password_changed_at, password_reset_token, password_reset_expires,
                   active, created_at
            FROM users
            WHERE email = LOWER($1) AND active
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Finds an active account by id
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, photo, role, password_hash,
                   password_changed_at, password_reset_token, password_reset_expires,
                   active, created_at
            FROM users
            WHERE id = $1 AND active
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Stores a new password hash and invalidates existing sessions
    ///
    /// `password_changed_at` is set to one second in the past so a session
    /// token issued in the same second as the change is already stale. Any
    /// outstanding reset token is consumed.
    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_changed_at = NOW() - INTERVAL '1 second',
                password_reset_token = NULL,
                password_reset_expires = NULL
            WHERE id = $1
            RETURNING id, name, email, photo, role, password_hash,
                      password_changed_at, password_reset_token, password_reset_expires,
                      active, created_at
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }

    /// Stores the hash and expiry of a freshly issued reset token
    pub async fn set_reset_token(
        pool: &PgPool,
        id: Uuid,
        token_hash: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET password_reset_token = $2, password_reset_expires = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Clears any outstanding reset token (e.g. after a failed reset email)
    pub async fn clear_reset_token(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET password_reset_token = NULL, password_reset_expires = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Finds an active account by reset-token hash, if the token is unexpired
    pub async fn find_by_reset_token(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, photo, role, password_hash,
                   password_changed_at, password_reset_token, password_reset_expires,
                   active, created_at
            FROM users
            WHERE password_reset_token = $1
              AND password_reset_expires > NOW()
              AND active
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await
    }

    /// Soft-deletes an account
    ///
    /// The row stays; default lookups and listings no longer see it.
    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Jonas".to_string(),
            email: "jonas@example.com".to_string(),
            photo: "default.jpg".to_string(),
            role: Role::User,
            password_hash: "$argon2id$v=19$m=65536,t=3,p=4$abc$def".to_string(),
            password_changed_at: None,
            password_reset_token: Some("deadbeef".to_string()),
            password_reset_expires: Some(Utc::now()),
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_labels() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::LeadGuide.as_str(), "lead-guide");
        assert_eq!(
            serde_json::to_value(Role::LeadGuide).unwrap(),
            serde_json::json!("lead-guide")
        );
        assert_eq!(
            serde_json::from_value::<Role>(serde_json::json!("guide")).unwrap(),
            Role::Guide
        );
    }

    #[test]
    fn test_serialized_user_has_no_credential_fields() {
        let json = serde_json::to_value(sample_user()).unwrap();
        let obj = json.as_object().unwrap();

        assert!(obj.contains_key("name"));
        assert!(obj.contains_key("email"));
        assert!(!obj.contains_key("password_hash"));
        assert!(!obj.contains_key("password_changed_at"));
        assert!(!obj.contains_key("password_reset_token"));
        assert!(!obj.contains_key("password_reset_expires"));
        assert!(!obj.contains_key("active"));

        // the hash value itself must not appear anywhere in the output
        assert!(!json.to_string().contains("argon2id"));
    }

    #[test]
    fn test_update_user_only_present_fields() {
        let patch = UpdateUser {
            name: Some("New Name".to_string()),
            ..Default::default()
        };
        let cols = patch.columns();
        assert_eq!(cols.len(), 1);
        assert_eq!(cols[0].0, "name");
    }

    #[test]
    fn test_update_user_lowercases_email() {
        let patch = UpdateUser {
            email: Some("Mixed@Example.COM".to_string()),
            ..Default::default()
        };
        let cols = patch.columns();
        assert_eq!(
            cols[0].1,
            SqlValue::Text("mixed@example.com".to_string())
        );
    }

    #[test]
    fn test_update_user_role_is_enum_bound() {
        let patch = UpdateUser {
            role: Some(Role::LeadGuide),
            ..Default::default()
        };
        let cols = patch.columns();
        assert_eq!(
            cols[0].1,
            SqlValue::Enum("user_role", "lead-guide".to_string())
        );
    }

    #[test]
    fn test_update_user_validation() {
        let bad_email = UpdateUser {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(bad_email.validate().is_err());

        let empty_name = UpdateUser {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(empty_name.validate().is_err());
    }
}
