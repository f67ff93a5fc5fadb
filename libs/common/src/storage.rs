//! Object storage for listing photos and profile pictures
//!
//! Files never pass through the services. Clients upload and download them
//! directly with short-lived presigned URLs, and records only ever persist the
//! object path. Every presign goes through the same path-scoped rules:
//!
//! | prefix                        | guests | signed-in users         |
//! |-------------------------------|--------|-------------------------|
//! | `properties/{property_id}/*`  | read   | read, write, delete     |
//! | `profiles/{identity}/*`       | none   | owner: read, write, delete |
//! | `public/*`                    | read   | read                    |

use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, presigning::PresigningConfig};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Errors raised by storage operations
#[derive(Error, Debug, PartialEq)]
pub enum StorageError {
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Access to {path} denied for {operation:?}")]
    AccessDenied { path: String, operation: Operation },

    #[error("Failed to presign request: {0}")]
    Presign(String),
}

/// Storage operations subject to access rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
    Delete,
}

/// Who is asking for access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal<'a> {
    Guest,
    /// Signed-in identity, by subject
    User(&'a str),
}

/// A validated object path and the scope it falls under
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoragePath {
    Property { property_id: String, key: String },
    Profile { identity: String, key: String },
    Public { key: String },
}

impl StoragePath {
    /// Parse and validate an object path
    pub fn parse(path: &str) -> Result<Self, StorageError> {
        let invalid = || StorageError::InvalidPath(path.to_string());

        if path.is_empty() || path.starts_with('/') || path.ends_with('/') {
            return Err(invalid());
        }

        let segments: Vec<&str> = path.split('/').collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == ".." || s.contains('\\'))
        {
            return Err(invalid());
        }

        match segments.as_slice() {
            ["properties", property_id, _, ..] => Ok(StoragePath::Property {
                property_id: property_id.to_string(),
                key: path.to_string(),
            }),
            ["profiles", identity, _, ..] => Ok(StoragePath::Profile {
                identity: identity.to_string(),
                key: path.to_string(),
            }),
            ["public", _, ..] => Ok(StoragePath::Public {
                key: path.to_string(),
            }),
            _ => Err(invalid()),
        }
    }

    /// Full object key
    pub fn key(&self) -> &str {
        match self {
            StoragePath::Property { key, .. }
            | StoragePath::Profile { key, .. }
            | StoragePath::Public { key } => key,
        }
    }

    /// Whether `principal` may perform `operation` on this path
    pub fn allows(&self, principal: Principal<'_>, operation: Operation) -> bool {
        match (self, principal) {
            (StoragePath::Property { .. }, Principal::Guest) => operation == Operation::Read,
            (StoragePath::Property { .. }, Principal::User(_)) => true,
            (StoragePath::Profile { .. }, Principal::Guest) => false,
            (StoragePath::Profile { identity, .. }, Principal::User(sub)) => identity == sub,
            (StoragePath::Public { .. }, _) => operation == Operation::Read,
        }
    }

    /// Like [`StoragePath::allows`], as a result
    pub fn authorize(
        &self,
        principal: Principal<'_>,
        operation: Operation,
    ) -> Result<(), StorageError> {
        if self.allows(principal, operation) {
            Ok(())
        } else {
            Err(StorageError::AccessDenied {
                path: self.key().to_string(),
                operation,
            })
        }
    }
}

/// Path under which a user's profile photo is stored
///
/// The extension is taken from the uploaded file name and defaults to `jpg`.
pub fn profile_photo_path(identity: &str, file_name: &str) -> String {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "jpg".to_string());

    format!("profiles/{}/profile.{}", identity, extension)
}

/// Whether a stored image reference is already an absolute URL
pub fn is_absolute_url(reference: &str) -> bool {
    reference.starts_with("https://") || reference.starts_with("http://")
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket holding every object
    pub bucket: String,
    /// Lifetime of presigned URLs in seconds
    pub url_ttl_seconds: u64,
    /// Endpoint override for S3-compatible stores
    pub endpoint: Option<String>,
}

impl StorageConfig {
    /// Create a new StorageConfig from environment variables
    ///
    /// # Environment Variables
    /// - `STORAGE_BUCKET`: Bucket name (default: "valorhomes-images")
    /// - `STORAGE_URL_TTL_SECONDS`: Presigned URL lifetime (default: 900)
    /// - `STORAGE_ENDPOINT`: Optional S3-compatible endpoint
    pub fn from_env() -> Self {
        let bucket =
            std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| "valorhomes-images".to_string());

        let url_ttl_seconds = std::env::var("STORAGE_URL_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(900);

        let endpoint = std::env::var("STORAGE_ENDPOINT")
            .ok()
            .filter(|e| !e.is_empty());

        Self {
            bucket,
            url_ttl_seconds,
            endpoint,
        }
    }
}

/// A time-limited URL for a single object operation
#[derive(Debug, Clone, Serialize)]
pub struct PresignedUrl {
    pub path: String,
    pub url: String,
    pub method: &'static str,
    pub expires_in: u64,
}

/// Presigning client for the image bucket
#[derive(Clone)]
pub struct Storage {
    client: Client,
    config: StorageConfig,
}

impl Storage {
    /// Build a storage client from the ambient AWS configuration
    pub async fn new(config: StorageConfig) -> Self {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        info!("Storage client initialized for bucket {}", config.bucket);
        Self {
            client: Client::from_conf(builder.build()),
            config,
        }
    }

    fn presigning_config(&self) -> Result<PresigningConfig, StorageError> {
        PresigningConfig::expires_in(Duration::from_secs(self.config.url_ttl_seconds))
            .map_err(|e| StorageError::Presign(e.to_string()))
    }

    /// Presign a download after checking read access
    pub async fn presign_get(
        &self,
        path: &str,
        principal: Principal<'_>,
    ) -> Result<PresignedUrl, StorageError> {
        let path = StoragePath::parse(path)?;
        path.authorize(principal, Operation::Read)?;

        let request = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(path.key())
            .presigned(self.presigning_config()?)
            .await
            .map_err(|e| {
                error!("Failed to presign download of {}: {}", path.key(), e);
                StorageError::Presign(e.to_string())
            })?;

        Ok(PresignedUrl {
            path: path.key().to_string(),
            url: request.uri().to_string(),
            method: "GET",
            expires_in: self.config.url_ttl_seconds,
        })
    }

    /// Presign an upload after checking write access
    pub async fn presign_put(
        &self,
        path: &str,
        content_type: &str,
        principal: Principal<'_>,
    ) -> Result<PresignedUrl, StorageError> {
        let path = StoragePath::parse(path)?;
        path.authorize(principal, Operation::Write)?;

        let request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(path.key())
            .content_type(content_type)
            .presigned(self.presigning_config()?)
            .await
            .map_err(|e| {
                error!("Failed to presign upload of {}: {}", path.key(), e);
                StorageError::Presign(e.to_string())
            })?;

        Ok(PresignedUrl {
            path: path.key().to_string(),
            url: request.uri().to_string(),
            method: "PUT",
            expires_in: self.config.url_ttl_seconds,
        })
    }

    /// Turn a stored image reference into something a browser can load
    ///
    /// Absolute URLs (seeded stock photos) pass through untouched; storage
    /// paths are presigned for the caller. Returns `None` when the caller may
    /// not read the object or presigning fails.
    pub async fn resolve_image(&self, reference: &str, principal: Principal<'_>) -> Option<String> {
        if is_absolute_url(reference) {
            return Some(reference.to_string());
        }

        match self.presign_get(reference, principal).await {
            Ok(presigned) => Some(presigned.url),
            Err(StorageError::AccessDenied { .. }) => None,
            Err(e) => {
                error!("Failed to resolve image {}: {}", reference, e);
                None
            }
        }
    }
}
