//! SQLite profile repository implementation.
//!
//! Implements `ProfileRepository` from `tattle-core` using sqlx with split
//! read/write pools. The OAuth credential pair lives in three nullable
//! columns on the profiles table and is only touched through the dedicated
//! credential methods.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::Row;

use tattle_core::repository::profile::ProfileRepository;
use tattle_types::credential::Credential;
use tattle_types::error::RepositoryError;
use tattle_types::profile::{Profile, ProfileId};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `ProfileRepository`.
pub struct SqliteProfileRepository {
    pool: DatabasePool,
}

impl SqliteProfileRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Profile.
struct ProfileRow {
    id: String,
    external_id: Option<String>,
    name: String,
    email: Option<String>,
    avatar_url: Option<String>,
    bio: Option<String>,
    interests: String,
    personality: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ProfileRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            external_id: row.try_get("external_id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            avatar_url: row.try_get("avatar_url")?,
            bio: row.try_get("bio")?,
            interests: row.try_get("interests")?,
            personality: row.try_get("personality")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_profile(self) -> Result<Profile, RepositoryError> {
        let id = self
            .id
            .parse::<ProfileId>()
            .map_err(|e| RepositoryError::Query(format!("invalid profile id: {e}")))?;

        let interests: Vec<String> = serde_json::from_str(&self.interests)
            .map_err(|e| RepositoryError::Query(format!("invalid interests JSON: {e}")))?;

        Ok(Profile {
            id,
            external_id: self.external_id,
            name: self.name,
            email: self.email,
            avatar_url: self.avatar_url,
            bio: self.bio,
            interests,
            personality: self.personality,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn credential_from_columns(
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<String>,
) -> Result<Option<Credential>, RepositoryError> {
    let Some(access_token) = access_token else {
        return Ok(None);
    };
    Ok(Some(Credential {
        access_token: SecretString::from(access_token),
        refresh_token: refresh_token.map(SecretString::from),
        expires_at: expires_at.as_deref().map(parse_datetime).transpose()?,
    }))
}

impl ProfileRepository for SqliteProfileRepository {
    async fn create(&self, profile: &Profile) -> Result<Profile, RepositoryError> {
        let interests_json = serde_json::to_string(&profile.interests)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO profiles (id, external_id, name, email, avatar_url, bio, interests, personality, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(profile.id.to_string())
        .bind(&profile.external_id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.avatar_url)
        .bind(&profile.bio)
        .bind(&interests_json)
        .bind(&profile.personality)
        .bind(format_datetime(&profile.created_at))
        .bind(format_datetime(&profile.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(profile.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict(format!(
                    "external id '{}' already exists",
                    profile.external_id.as_deref().unwrap_or_default()
                )))
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let profile_row = ProfileRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(profile_row.into_profile()?))
            }
            None => Ok(None),
        }
    }

    async fn get_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM profiles WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let profile_row = ProfileRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(profile_row.into_profile()?))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, profile: &Profile) -> Result<Profile, RepositoryError> {
        let interests_json = serde_json::to_string(&profile.interests)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE profiles SET name = ?, email = ?, avatar_url = ?, bio = ?, interests = ?, personality = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.avatar_url)
        .bind(&profile.bio)
        .bind(&interests_json)
        .bind(&profile.personality)
        .bind(format_datetime(&profile.updated_at))
        .bind(profile.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(profile.clone())
    }

    async fn get_credential(&self, id: &ProfileId) -> Result<Option<Credential>, RepositoryError> {
        let row = sqlx::query(
            "SELECT access_token, refresh_token, token_expires_at FROM profiles WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        credential_from_columns(
            row.try_get("access_token")
                .map_err(|e| RepositoryError::Query(e.to_string()))?,
            row.try_get("refresh_token")
                .map_err(|e| RepositoryError::Query(e.to_string()))?,
            row.try_get("token_expires_at")
                .map_err(|e| RepositoryError::Query(e.to_string()))?,
        )
    }

    async fn save_credential(
        &self,
        id: &ProfileId,
        credential: &Credential,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE profiles SET access_token = ?, refresh_token = ?, token_expires_at = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(credential.access_token.expose_secret())
        .bind(
            credential
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
        )
        .bind(credential.expires_at.as_ref().map(format_datetime))
        .bind(format_datetime(&Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn latest_with_credential(
        &self,
    ) -> Result<Option<(ProfileId, Credential)>, RepositoryError> {
        self.latest_credentialed(None).await
    }

    async fn latest_with_valid_credential(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<(ProfileId, Credential)>, RepositoryError> {
        self.latest_credentialed(Some(now)).await
    }
}

impl SqliteProfileRepository {
    /// Most-recently-updated profile with a stored token; when `valid_at`
    /// is given, only credentials unexpired at that instant qualify.
    /// Expiry comparison happens in Rust so the stored timestamp format
    /// never matters.
    async fn latest_credentialed(
        &self,
        valid_at: Option<DateTime<Utc>>,
    ) -> Result<Option<(ProfileId, Credential)>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, access_token, refresh_token, token_expires_at FROM profiles
             WHERE access_token IS NOT NULL ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        for row in rows {
            let id: String = row
                .try_get("id")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let credential = credential_from_columns(
                row.try_get("access_token")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?,
                row.try_get("refresh_token")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?,
                row.try_get("token_expires_at")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?,
            )?;

            if let Some(credential) = credential {
                if valid_at.is_none_or(|now| credential.is_valid_at(now)) {
                    let id = id
                        .parse::<ProfileId>()
                        .map_err(|e| RepositoryError::Query(format!("invalid profile id: {e}")))?;
                    return Ok(Some((id, credential)));
                }
            }
        }

        Ok(None)
    }
}
