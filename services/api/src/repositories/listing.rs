//! Listing repository for database operations

use common::error::DatabaseResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{
    Pagination,
    listing::{Listing, ListingFields, ListingFilter, ListingStatus},
};

const LISTING_COLUMNS: &str = "id, slug, address, city, state, zip_code, price, beds, baths, \
                               sqft, assumable_rate, loan_balance, equity, description, \
                               school_district, hoa_fees, amenities, primary_image, images, \
                               listing_date, status, user_id, created_at, updated_at";

/// Listing repository for database operations
#[derive(Clone)]
pub struct ListingRepository {
    pool: PgPool,
}

impl ListingRepository {
    /// Create a new listing repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active listings matching `filter`, newest first, with the total match count
    pub async fn list_active(
        &self,
        filter: &ListingFilter,
        pagination: Pagination,
    ) -> DatabaseResult<(Vec<Listing>, i64)> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {LISTING_COLUMNS} FROM listings"));
        push_active_filter(&mut qb, filter);
        qb.push(" ORDER BY listing_date DESC, created_at DESC LIMIT ")
            .push_bind(pagination.limit as i64)
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let listings = qb
            .build_query_as::<Listing>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM listings");
        push_active_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((listings, total))
    }

    pub async fn find_by_slug(&self, slug: &str) -> DatabaseResult<Option<Listing>> {
        let listing = sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(listing)
    }

    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Listing>> {
        let listing = sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(listing)
    }

    /// Every listing a user owns, any status
    pub async fn list_by_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Listing>> {
        let listings = sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE user_id = $1 \
             ORDER BY listing_date DESC, created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    pub async fn count_active_by_user(&self, user_id: Uuid) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM listings WHERE user_id = $1 AND status = $2",
        )
        .bind(user_id)
        .bind(ListingStatus::Active)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn slug_exists(&self, slug: &str) -> DatabaseResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM listings WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// Insert a listing; fails with a unique violation if the slug is taken
    pub async fn create(
        &self,
        user_id: Uuid,
        slug: &str,
        fields: &ListingFields,
    ) -> DatabaseResult<Listing> {
        let listing = sqlx::query_as::<_, Listing>(&format!(
            r#"
            INSERT INTO listings (
                id, slug, address, city, state, zip_code, price, beds, baths, sqft,
                assumable_rate, loan_balance, equity, description, school_district, hoa_fees,
                amenities, primary_image, images, listing_date, status, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22)
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(slug)
        .bind(&fields.address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.zip_code)
        .bind(fields.price)
        .bind(fields.beds)
        .bind(fields.baths)
        .bind(fields.sqft)
        .bind(fields.assumable_rate)
        .bind(fields.loan_balance)
        .bind(fields.equity)
        .bind(&fields.description)
        .bind(&fields.school_district)
        .bind(fields.hoa_fees)
        .bind(&fields.amenities)
        .bind(&fields.primary_image)
        .bind(&fields.images)
        .bind(fields.listing_date)
        .bind(fields.status)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(listing)
    }

    /// Overwrite the writable fields of a listing
    pub async fn update(&self, id: Uuid, fields: &ListingFields) -> DatabaseResult<Option<Listing>> {
        let listing = sqlx::query_as::<_, Listing>(&format!(
            r#"
            UPDATE listings
            SET address = $2, city = $3, state = $4, zip_code = $5, price = $6, beds = $7,
                baths = $8, sqft = $9, assumable_rate = $10, loan_balance = $11, equity = $12,
                description = $13, school_district = $14, hoa_fees = $15, amenities = $16,
                primary_image = $17, images = $18, listing_date = $19, status = $20,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&fields.address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.zip_code)
        .bind(fields.price)
        .bind(fields.beds)
        .bind(fields.baths)
        .bind(fields.sqft)
        .bind(fields.assumable_rate)
        .bind(fields.loan_balance)
        .bind(fields.equity)
        .bind(&fields.description)
        .bind(&fields.school_district)
        .bind(fields.hoa_fees)
        .bind(&fields.amenities)
        .bind(&fields.primary_image)
        .bind(&fields.images)
        .bind(fields.listing_date)
        .bind(fields.status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(listing)
    }

    pub async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn push_active_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ListingFilter) {
    qb.push(" WHERE status = ").push_bind(ListingStatus::Active);

    if let Some(state) = &filter.state {
        qb.push(" AND state = ").push_bind(state.clone());
    }

    if let Some(max_price) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max_price);
    }

    if let Some(min_beds) = filter.min_beds {
        qb.push(" AND beds >= ").push_bind(min_beds);
    }

    if let Some(listed_since) = filter.listed_since {
        qb.push(" AND listing_date >= ").push_bind(listed_since);
    }
}
