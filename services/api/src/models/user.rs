//! User profile models

use chrono::{DateTime, Utc};
use common::{
    storage::{StoragePath, profile_photo_path},
    token::AuthUser,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_FIRST_NAME: &str = "First";
pub const DEFAULT_LAST_NAME: &str = "Last";

/// User profile row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    /// Identity-pool subject that owns this profile
    pub owner_sub: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    /// Storage path, never a URL
    pub profile_photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_owned_by(&self, caller: &AuthUser) -> bool {
        self.owner_sub == caller.sub
    }
}

/// Values for a lazily created profile
#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub owner_sub: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
}

impl NewProfile {
    /// Seed a profile from the caller's token, falling back to placeholder names
    pub fn from_identity(identity: &AuthUser) -> Self {
        Self {
            owner_sub: identity.sub.clone(),
            email: identity.email.trim().to_lowercase(),
            first_name: name_or(identity.given_name.as_deref(), DEFAULT_FIRST_NAME),
            last_name: name_or(identity.family_name.as_deref(), DEFAULT_LAST_NAME),
            phone_number: identity
                .phone_number
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        }
    }
}

fn name_or(name: Option<&str>, fallback: &str) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Request body for editing the caller's profile
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    /// Empty clears the number
    pub phone_number: Option<String>,
    /// Absent keeps the current photo, empty removes it
    pub profile_photo_path: Option<String>,
}

/// Validated profile edit
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileChanges {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub profile_photo_path: Option<Option<String>>,
}

impl ProfileUpdate {
    pub fn validate(self, owner_sub: &str) -> Result<ProfileChanges, String> {
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        if first_name.is_empty() || last_name.is_empty() {
            return Err("First name and last name are required.".to_string());
        }

        let phone_number = self
            .phone_number
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let profile_photo_path = match self.profile_photo_path.map(|p| p.trim().to_string()) {
            None => None,
            Some(path) if path.is_empty() => Some(None),
            Some(path) => {
                let parsed = StoragePath::parse(&path)
                    .map_err(|_| format!("Invalid profile photo path: {}", path))?;
                match parsed {
                    StoragePath::Profile { identity, .. } if identity == owner_sub => {
                        Some(Some(path))
                    }
                    _ => {
                        return Err(
                            "Profile photos must be stored under your own profile folder."
                                .to_string(),
                        );
                    }
                }
            }
        };

        Ok(ProfileChanges {
            first_name,
            last_name,
            phone_number,
            profile_photo_path,
        })
    }
}

/// Request for a presigned profile photo upload
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoUploadRequest {
    pub file_name: String,
    pub content_type: String,
}

impl PhotoUploadRequest {
    pub fn path_for(&self, owner_sub: &str) -> Result<String, String> {
        if !self.content_type.starts_with("image/") {
            return Err("Profile photos must be images.".to_string());
        }
        Ok(profile_photo_path(owner_sub, &self.file_name))
    }
}

/// The caller's own profile
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: User,
    pub photo_url: Option<String>,
    pub active_listing_count: i64,
}

/// Response for profile initialization
#[derive(Debug, Clone, Serialize)]
pub struct InitializedProfile {
    pub created: bool,
    pub profile: User,
}

/// What other signed-in users see
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub member_since: DateTime<Utc>,
    pub photo_url: Option<String>,
    pub active_listing_count: i64,
    pub is_own_profile: bool,
}

/// Listing owner shown on a listing page
#[derive(Debug, Clone, Serialize)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub member_since: DateTime<Utc>,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            member_since: user.created_at,
        }
    }
}
