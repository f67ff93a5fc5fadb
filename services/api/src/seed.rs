//! Sample listings for demo environments

use chrono::NaiveDate;
use common::error::DatabaseResult;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::listing::NewListing,
    repositories::ListingRepository,
};

const SAMPLE_LISTINGS: &str = include_str!("../seed/listings.json");

pub fn sample_listings() -> Result<Vec<NewListing>, serde_json::Error> {
    serde_json::from_str(SAMPLE_LISTINGS)
}

#[derive(Debug, Default, Serialize)]
pub struct SeedReport {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
}

impl SeedReport {
    /// Record an insert; losing a race for the slug counts as skipped
    fn record<T>(&mut self, slug: String, inserted: DatabaseResult<T>) -> ApiResult<()> {
        match inserted {
            Ok(_) => self.created.push(slug),
            Err(e) if e.is_unique_violation() => self.skipped.push(slug),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}

/// Create every sample listing for `user_id`, skipping slugs already taken
pub async fn seed_listings(
    listings: &ListingRepository,
    user_id: Uuid,
    today: NaiveDate,
) -> ApiResult<SeedReport> {
    let samples =
        sample_listings().map_err(|e| ApiError::Internal(format!("invalid seed data: {}", e)))?;

    let mut report = SeedReport::default();
    for sample in samples {
        let slug = sample.slug_base();
        if listings.slug_exists(&slug).await? {
            report.skipped.push(slug);
            continue;
        }

        let fields = sample
            .into_fields(today)
            .map_err(|e| ApiError::Internal(format!("invalid seed listing {}: {}", slug, e)))?;
        let inserted = listings.create(user_id, &slug, &fields).await;
        report.record(slug, inserted)?;
    }

    info!(
        "Seeded {} listings for {} ({} skipped)",
        report.created.len(),
        user_id,
        report.skipped.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::ListingStatus;
    use common::error::DatabaseError;
    use sqlx::error::{DatabaseError as SqlxDatabaseError, ErrorKind};
    use std::{error::Error as StdError, fmt};

    #[derive(Debug)]
    struct DuplicateSlug;

    impl fmt::Display for DuplicateSlug {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "duplicate key value violates unique constraint \"listings_slug_key\"")
        }
    }

    impl StdError for DuplicateSlug {}

    impl SqlxDatabaseError for DuplicateSlug {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn test_record_counts_lost_slug_race_as_skipped() {
        let mut report = SeedReport::default();
        report.record("a".to_string(), Ok(())).unwrap();

        let duplicate = DatabaseError::Query(sqlx::Error::Database(Box::new(DuplicateSlug)));
        report.record::<()>("b".to_string(), Err(duplicate)).unwrap();

        assert_eq!(report.created, vec!["a".to_string()]);
        assert_eq!(report.skipped, vec!["b".to_string()]);
    }

    #[test]
    fn test_record_propagates_other_errors() {
        let mut report = SeedReport::default();
        let failure = DatabaseError::Query(sqlx::Error::RowNotFound);
        assert!(report.record::<()>("c".to_string(), Err(failure)).is_err());
        assert!(report.created.is_empty() && report.skipped.is_empty());
    }

    #[test]
    fn test_sample_listings_are_valid() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let samples = sample_listings().unwrap();
        assert_eq!(samples.len(), 10);

        for sample in samples {
            let slug = sample.slug_base();
            assert_eq!(Some(slug.as_str()), sample.slug.as_deref());
            let fields = sample.into_fields(today).unwrap();
            assert_eq!(fields.status, ListingStatus::Active);
            assert!(fields.listing_date < today + chrono::Duration::days(1));
        }
    }

    #[test]
    fn test_first_sample() {
        let samples = sample_listings().unwrap();
        let colonial = &samples[0];
        assert_eq!(colonial.slug.as_deref(), Some("charming-colonial-san-diego-ca"));
        assert_eq!(colonial.price, 650000);
        assert_eq!(colonial.loan_balance, 450000);
        assert_eq!(colonial.equity, Some(200000));
        assert_eq!(colonial.assumable_rate, 2.75);
    }
}
