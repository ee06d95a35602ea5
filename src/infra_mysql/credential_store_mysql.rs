use super::util::is_dup_key;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use std::sync::Arc;
use uuid::Uuid;

/// Credential store over the `user_credential` table (see `schema/mysql.sql`).
pub struct MySqlCredentialStore {
    pool: MySqlPool,
    hasher: Arc<dyn CredentialHasher>,
}

impl MySqlCredentialStore {
    pub fn new(pool: MySqlPool, hasher: Arc<dyn CredentialHasher>) -> Self {
        MySqlCredentialStore { pool, hasher }
    }

    #[inline]
    fn uid_as_bytes(id: &UserId) -> &[u8] {
        id.0.as_bytes()
    }

    #[inline]
    fn uid_from_bytes(id: &[u8]) -> Result<UserId, AuthError> {
        Ok(UserId(
            Uuid::from_slice(id).map_err(|e| AuthError::Internal(e.to_string()))?,
        ))
    }

    fn row_to_identity(row: MySqlRow) -> Result<Identity, AuthError> {
        let user_id_bytes: Vec<u8> = row
            .try_get("user_id")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(Identity {
            id: Self::uid_from_bytes(&user_id_bytes)?,
            email,
        })
    }

    fn normalize(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MySqlCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, email
FROM user_credential
WHERE email = ?
"#,
        )
        .bind(Self::normalize(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        row_opt.map(Self::row_to_identity).transpose()
    }

    async fn verify_secret(
        &self,
        identity: &Identity,
        candidate: &str,
    ) -> Result<bool, AuthError> {
        let hash_opt: Option<String> = sqlx::query_scalar(
            "SELECT password_hash FROM user_credential WHERE user_id = ?",
        )
        .bind(Self::uid_as_bytes(&identity.id))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(format!("query password hash: {e}")))?;

        match hash_opt {
            Some(password_hash) => self.hasher.verify_password(candidate, &password_hash).await,
            None => Ok(false),
        }
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_credential WHERE email = ?)",
        )
        .bind(Self::normalize(email))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(exists != 0)
    }

    async fn create(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = Identity {
            id: UserId::new_v4(),
            email: Self::normalize(email),
        };
        let password_hash = self.hasher.hash_password(password).await?;

        sqlx::query(
            r#"
INSERT INTO user_credential (user_id, email, password_hash)
VALUES (?, ?, ?)
"#,
        )
        .bind(Self::uid_as_bytes(&identity.id))
        .bind(&identity.email)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::UserExists
            } else {
                AuthError::StoreUnavailable(e.to_string())
            }
        })?;

        Ok(identity)
    }

    async fn list(&self) -> Result<Vec<Identity>, AuthError> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, email
FROM user_credential
ORDER BY created_at, email
"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        rows.into_iter().map(Self::row_to_identity).collect()
    }
}
