//! Repositories for database operations

use common::error::DatabaseResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{NewProfile, ProfileChanges, User};

pub mod listing;

pub use listing::ListingRepository;

const USER_COLUMNS: &str = "id, owner_sub, email, first_name, last_name, phone_number, \
                            profile_photo_path, created_at, updated_at";

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a profile unless one already exists for the subject or email
    ///
    /// Returns the stored profile and whether this call created it.
    pub async fn create_if_missing(&self, profile: &NewProfile) -> DatabaseResult<(User, bool)> {
        let inserted = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, owner_sub, email, first_name, last_name, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&profile.owner_sub)
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone_number)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(user) = inserted {
            return Ok((user, true));
        }

        let existing = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE owner_sub = $1 OR email = $2 \
             ORDER BY (owner_sub = $1) DESC LIMIT 1"
        ))
        .bind(&profile.owner_sub)
        .bind(&profile.email)
        .fetch_one(&self.pool)
        .await?;

        Ok((existing, false))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find the profile owned by an identity-pool subject
    pub async fn find_by_sub(&self, owner_sub: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE owner_sub = $1"
        ))
        .bind(owner_sub)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Apply a validated profile edit
    pub async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> DatabaseResult<Option<User>> {
        let keep_photo = changes.profile_photo_path.is_none();
        let photo = changes.profile_photo_path.clone().flatten();

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = $2,
                last_name = $3,
                phone_number = $4,
                profile_photo_path = CASE WHEN $5 THEN profile_photo_path ELSE $6 END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.phone_number)
        .bind(keep_photo)
        .bind(photo)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
