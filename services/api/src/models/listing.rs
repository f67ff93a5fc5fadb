//! Listing models for the API service

use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::{
    storage::{StoragePath, is_absolute_url},
    token::AuthUser,
};
use mortgage::{LoanQuote, PaymentComparison, format_currency, format_monthly_payment};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::user::{OwnerSummary, User};

const MAX_ASSUMABLE_RATE: f64 = 25.0;
const METADATA_EXCERPT_CHARS: usize = 150;

/// Listing lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "listing_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Pending,
    Sold,
    Archived,
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ListingStatus::Active),
            "pending" => Ok(ListingStatus::Pending),
            "sold" => Ok(ListingStatus::Sold),
            "archived" => Ok(ListingStatus::Archived),
            _ => Err("Status must be one of active, pending, sold or archived.".to_string()),
        }
    }
}

/// Listing row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub slug: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub price: i64,
    pub beds: i32,
    pub baths: f64,
    pub sqft: i32,
    pub assumable_rate: f64,
    pub loan_balance: i64,
    pub equity: i64,
    pub description: Option<String>,
    pub school_district: Option<String>,
    pub hoa_fees: Option<i32>,
    pub amenities: Vec<String>,
    /// Storage path or absolute URL
    pub primary_image: String,
    pub images: Vec<String>,
    pub listing_date: NaiveDate,
    pub status: ListingStatus,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }

    /// Whether `caller` signed in as the profile `owner` recorded for this listing
    pub fn is_owned_by(&self, owner: Option<&User>, caller: Option<&AuthUser>) -> bool {
        match (owner, caller) {
            (Some(owner), Some(caller)) => owner.id == self.user_id && owner.is_owned_by(caller),
            _ => false,
        }
    }

    /// Active listings are public; any other status is visible to its owner only
    pub fn is_visible_to(&self, owner: Option<&User>, caller: Option<&AuthUser>) -> bool {
        self.is_active() || self.is_owned_by(owner, caller)
    }

    /// Only the owning profile may update or delete
    pub fn can_be_modified_by(&self, profile: Option<&User>) -> bool {
        profile.is_some_and(|profile| profile.id == self.user_id)
    }

    pub fn payment_comparison(&self, market_rate: f64, term_years: u32) -> PaymentComparison {
        PaymentComparison::new(
            self.loan_balance as f64,
            self.assumable_rate,
            market_rate,
            term_years,
        )
    }

    pub fn loan_quote(&self, market_rate: f64, term_years: u32) -> LoanQuote {
        LoanQuote::new(
            self.price as f64,
            self.loan_balance as f64,
            self.assumable_rate,
            market_rate,
            term_years,
        )
    }

    /// Page title and description for the detail page
    pub fn metadata(&self) -> PageMetadata {
        let excerpt: String = self
            .description
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(METADATA_EXCERPT_CHARS)
            .collect();

        PageMetadata {
            title: format!("{} - {}, {} | ValorHomes", self.address, self.city, self.state),
            description: format!(
                "{} bed, {} bath home in {}, {}. VA loan assumable at {}%. {}",
                self.beds, self.baths, self.city, self.state, self.assumable_rate, excerpt
            )
            .trim_end()
            .to_string(),
        }
    }

    /// Writable fields of an existing listing
    pub fn fields(&self) -> ListingFields {
        ListingFields {
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
            price: self.price,
            beds: self.beds,
            baths: self.baths,
            sqft: self.sqft,
            assumable_rate: self.assumable_rate,
            loan_balance: self.loan_balance,
            equity: self.equity,
            description: self.description.clone(),
            school_district: self.school_district.clone(),
            hoa_fees: self.hoa_fees,
            amenities: self.amenities.clone(),
            primary_image: self.primary_image.clone(),
            images: self.images.clone(),
            listing_date: self.listing_date,
            status: self.status,
        }
    }
}

/// Every column a listing owner may set
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFields {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub price: i64,
    pub beds: i32,
    pub baths: f64,
    pub sqft: i32,
    pub assumable_rate: f64,
    pub loan_balance: i64,
    pub equity: i64,
    pub description: Option<String>,
    pub school_district: Option<String>,
    pub hoa_fees: Option<i32>,
    pub amenities: Vec<String>,
    pub primary_image: String,
    pub images: Vec<String>,
    pub listing_date: NaiveDate,
    pub status: ListingStatus,
}

impl ListingFields {
    pub fn validate(&self) -> Result<(), String> {
        for (value, label) in [
            (&self.address, "Address"),
            (&self.city, "City"),
            (&self.state, "State"),
            (&self.zip_code, "Zip code"),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{} is required.", label));
            }
        }

        if self.price < 0 {
            return Err("Price must not be negative.".to_string());
        }
        if self.beds < 0 {
            return Err("Beds must not be negative.".to_string());
        }
        if !self.baths.is_finite() || self.baths < 0.0 {
            return Err("Baths must not be negative.".to_string());
        }
        if self.sqft < 0 {
            return Err("Square footage must not be negative.".to_string());
        }
        if self.loan_balance < 0 {
            return Err("Loan balance must not be negative.".to_string());
        }
        if !self.assumable_rate.is_finite()
            || !(0.0..=MAX_ASSUMABLE_RATE).contains(&self.assumable_rate)
        {
            return Err("Assumable rate must be between 0 and 25 percent.".to_string());
        }
        if self.hoa_fees.is_some_and(|fees| fees < 0) {
            return Err("HOA fees must not be negative.".to_string());
        }

        if self.primary_image.trim().is_empty() {
            return Err("A primary image is required.".to_string());
        }
        for image in std::iter::once(&self.primary_image).chain(self.images.iter()) {
            if !is_absolute_url(image) && StoragePath::parse(image).is_err() {
                return Err(format!("Invalid image reference: {}", image));
            }
        }

        Ok(())
    }
}

/// Request body for creating a listing
#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub slug: Option<String>,
    /// Headline used to derive the slug when none is given
    pub title: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub price: i64,
    pub beds: i32,
    pub baths: f64,
    pub sqft: i32,
    pub assumable_rate: f64,
    pub loan_balance: i64,
    pub equity: Option<i64>,
    pub description: Option<String>,
    pub school_district: Option<String>,
    pub hoa_fees: Option<i32>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub primary_image: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub listing_date: Option<NaiveDate>,
    pub status: Option<String>,
}

impl NewListing {
    /// Slug to try first; a numeric suffix is added by the caller on conflict
    pub fn slug_base(&self) -> String {
        match self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => slugify(slug),
            None => {
                let headline = self
                    .title
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .unwrap_or(&self.address);
                slugify(&format!("{} {} {}", headline, self.city, self.state))
            }
        }
    }

    /// Apply defaults and validate
    pub fn into_fields(self, today: NaiveDate) -> Result<ListingFields, String> {
        let status = match self.status.as_deref() {
            Some(status) => status.parse()?,
            None => ListingStatus::Active,
        };

        let fields = ListingFields {
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip_code: self.zip_code.trim().to_string(),
            price: self.price,
            beds: self.beds,
            baths: self.baths,
            sqft: self.sqft,
            assumable_rate: self.assumable_rate,
            loan_balance: self.loan_balance,
            equity: self
                .equity
                .unwrap_or_else(|| default_equity(self.price, self.loan_balance)),
            description: non_blank(self.description),
            school_district: non_blank(self.school_district),
            hoa_fees: self.hoa_fees,
            amenities: clean_list(self.amenities),
            primary_image: self.primary_image.trim().to_string(),
            images: clean_list(self.images),
            listing_date: self.listing_date.unwrap_or(today),
            status,
        };

        fields.validate()?;
        Ok(fields)
    }
}

/// Partial update of a listing
///
/// Absent fields stay as they are; an empty string clears an optional text
/// field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingUpdate {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub price: Option<i64>,
    pub beds: Option<i32>,
    pub baths: Option<f64>,
    pub sqft: Option<i32>,
    pub assumable_rate: Option<f64>,
    pub loan_balance: Option<i64>,
    pub equity: Option<i64>,
    pub description: Option<String>,
    pub school_district: Option<String>,
    pub hoa_fees: Option<i32>,
    pub amenities: Option<Vec<String>>,
    pub primary_image: Option<String>,
    pub images: Option<Vec<String>>,
    pub listing_date: Option<NaiveDate>,
    pub status: Option<String>,
}

impl ListingUpdate {
    pub fn apply(self, mut fields: ListingFields) -> Result<ListingFields, String> {
        let financials_changed = self.price.is_some() || self.loan_balance.is_some();

        if let Some(address) = self.address {
            fields.address = address.trim().to_string();
        }
        if let Some(city) = self.city {
            fields.city = city.trim().to_string();
        }
        if let Some(state) = self.state {
            fields.state = state.trim().to_string();
        }
        if let Some(zip_code) = self.zip_code {
            fields.zip_code = zip_code.trim().to_string();
        }
        if let Some(price) = self.price {
            fields.price = price;
        }
        if let Some(beds) = self.beds {
            fields.beds = beds;
        }
        if let Some(baths) = self.baths {
            fields.baths = baths;
        }
        if let Some(sqft) = self.sqft {
            fields.sqft = sqft;
        }
        if let Some(rate) = self.assumable_rate {
            fields.assumable_rate = rate;
        }
        if let Some(loan_balance) = self.loan_balance {
            fields.loan_balance = loan_balance;
        }
        match self.equity {
            Some(equity) => fields.equity = equity,
            None if financials_changed => {
                fields.equity = default_equity(fields.price, fields.loan_balance)
            }
            None => {}
        }
        if self.description.is_some() {
            fields.description = non_blank(self.description);
        }
        if self.school_district.is_some() {
            fields.school_district = non_blank(self.school_district);
        }
        if let Some(hoa_fees) = self.hoa_fees {
            fields.hoa_fees = Some(hoa_fees);
        }
        if let Some(amenities) = self.amenities {
            fields.amenities = clean_list(amenities);
        }
        if let Some(primary_image) = self.primary_image {
            fields.primary_image = primary_image.trim().to_string();
        }
        if let Some(images) = self.images {
            fields.images = clean_list(images);
        }
        if let Some(listing_date) = self.listing_date {
            fields.listing_date = listing_date;
        }
        if let Some(status) = self.status {
            fields.status = status.parse()?;
        }

        fields.validate()?;
        Ok(fields)
    }
}

/// How recently a listing must have been listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListedWithin {
    Day,
    Week,
    Month,
}

impl ListedWithin {
    /// Earliest listing date that still matches
    pub fn since(self, today: NaiveDate) -> NaiveDate {
        let days = match self {
            ListedWithin::Day => 1,
            ListedWithin::Week => 7,
            ListedWithin::Month => 30,
        };
        today - Duration::days(days)
    }
}

/// Query parameters for browsing listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub state: Option<String>,
    pub max_price: Option<i64>,
    pub min_beds: Option<i32>,
    pub listed_within: Option<ListedWithin>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListingQuery {
    pub fn filter(&self, today: NaiveDate) -> ListingFilter {
        ListingFilter {
            state: self
                .state
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_ascii_uppercase),
            max_price: self.max_price,
            min_beds: self.min_beds,
            listed_since: self.listed_within.map(|window| window.since(today)),
        }
    }
}

/// Predicates applied on top of `status = 'active'`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub state: Option<String>,
    pub max_price: Option<i64>,
    pub min_beds: Option<i32>,
    pub listed_since: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
}

/// Preformatted figures for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentDisplay {
    pub price: String,
    pub equity_needed: String,
    pub market_payment: String,
    pub assumable_payment: String,
    pub monthly_savings: String,
}

impl PaymentDisplay {
    pub fn new(listing: &Listing, comparison: &PaymentComparison) -> Self {
        Self {
            price: format_currency(listing.price as f64),
            equity_needed: format_currency(mortgage::equity_needed(
                listing.price as f64,
                listing.loan_balance as f64,
            )),
            market_payment: format_monthly_payment(comparison.market_payment),
            assumable_payment: format_monthly_payment(comparison.assumable_payment),
            monthly_savings: format_monthly_payment(comparison.monthly_savings),
        }
    }
}

/// Listing as shown in search results
#[derive(Debug, Clone, Serialize)]
pub struct ListingCard {
    #[serde(flatten)]
    pub listing: Listing,
    pub image_url: Option<String>,
    pub payments: PaymentComparison,
    pub display: PaymentDisplay,
}

/// Listing as shown on its own page
#[derive(Debug, Clone, Serialize)]
pub struct ListingDetail {
    #[serde(flatten)]
    pub listing: Listing,
    pub primary_image_url: Option<String>,
    pub image_urls: Vec<String>,
    pub quote: LoanQuote,
    pub display: PaymentDisplay,
    pub owner: Option<OwnerSummary>,
    pub is_owner: bool,
    pub metadata: PageMetadata,
}

/// Lowercase, with every run of non-alphanumerics collapsed to `-`
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "listing".to_string()
    } else {
        slug.to_string()
    }
}

/// `attempt` 0 is the base itself, then `-2`, `-3`, ...
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt + 1)
    }
}

fn default_equity(price: i64, loan_balance: i64) -> i64 {
    price.saturating_sub(loan_balance).max(0)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    fn new_listing() -> NewListing {
        NewListing {
            slug: None,
            title: None,
            address: "123 Oak Street".to_string(),
            city: "San Diego".to_string(),
            state: "CA".to_string(),
            zip_code: "92101".to_string(),
            price: 650000,
            beds: 3,
            baths: 2.0,
            sqft: 1800,
            assumable_rate: 2.75,
            loan_balance: 450000,
            equity: None,
            description: Some("Beautiful colonial-style home.".to_string()),
            school_district: None,
            hoa_fees: Some(150),
            amenities: vec!["Garage".to_string(), " ".to_string()],
            primary_image: "properties/oak-street/front.jpg".to_string(),
            images: vec![],
            listing_date: None,
            status: None,
        }
    }

    fn listing() -> Listing {
        let fields = new_listing().into_fields(today()).unwrap();
        Listing {
            id: Uuid::new_v4(),
            slug: "123-oak-street-san-diego-ca".to_string(),
            address: fields.address,
            city: fields.city,
            state: fields.state,
            zip_code: fields.zip_code,
            price: fields.price,
            beds: fields.beds,
            baths: fields.baths,
            sqft: fields.sqft,
            assumable_rate: fields.assumable_rate,
            loan_balance: fields.loan_balance,
            equity: fields.equity,
            description: fields.description,
            school_district: fields.school_district,
            hoa_fees: fields.hoa_fees,
            amenities: fields.amenities,
            primary_image: fields.primary_image,
            images: fields.images,
            listing_date: fields.listing_date,
            status: fields.status,
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn profile(id: Uuid, sub: &str) -> User {
        User {
            id,
            owner_sub: sub.to_string(),
            email: format!("{}@example.com", sub),
            first_name: "Maria".to_string(),
            last_name: "Rivera".to_string(),
            phone_number: None,
            profile_photo_path: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn caller(sub: &str) -> AuthUser {
        AuthUser {
            sub: sub.to_string(),
            email: format!("{}@example.com", sub),
            email_verified: true,
            given_name: None,
            family_name: None,
            phone_number: None,
            token_id: "jti".to_string(),
            expires_at: 0,
        }
    }

    #[test]
    fn test_active_listing_is_public() {
        let listing = listing();
        let owner = profile(listing.user_id, "owner-sub");
        let stranger = caller("stranger-sub");

        assert!(listing.is_visible_to(Some(&owner), None));
        assert!(listing.is_visible_to(Some(&owner), Some(&stranger)));
        assert!(listing.is_visible_to(None, None));
    }

    #[test]
    fn test_inactive_listing_is_owner_only() {
        let mut listing = listing();
        let owner = profile(listing.user_id, "owner-sub");

        for status in [ListingStatus::Pending, ListingStatus::Sold, ListingStatus::Archived] {
            listing.status = status;
            assert!(!listing.is_visible_to(Some(&owner), None));
            assert!(!listing.is_visible_to(Some(&owner), Some(&caller("stranger-sub"))));
            assert!(listing.is_visible_to(Some(&owner), Some(&caller("owner-sub"))));
            // Owner record missing or belonging to another listing
            assert!(!listing.is_visible_to(None, Some(&caller("owner-sub"))));
            let other = profile(Uuid::new_v4(), "owner-sub");
            assert!(!listing.is_visible_to(Some(&other), Some(&caller("owner-sub"))));
        }
    }

    #[test]
    fn test_only_owner_may_modify() {
        let listing = listing();
        let owner = profile(listing.user_id, "owner-sub");
        let stranger = profile(Uuid::new_v4(), "stranger-sub");

        assert!(listing.can_be_modified_by(Some(&owner)));
        assert!(!listing.can_be_modified_by(Some(&stranger)));
        assert!(!listing.can_be_modified_by(None));
    }

    #[test]
    fn test_extreme_financials_do_not_overflow() {
        let mut listing = new_listing();
        listing.price = i64::MAX;
        listing.loan_balance = -1;
        assert!(listing.into_fields(today()).is_err());

        let mut listing = new_listing();
        listing.price = i64::MAX;
        listing.loan_balance = 0;
        assert_eq!(listing.into_fields(today()).unwrap().equity, i64::MAX);

        let fields = new_listing().into_fields(today()).unwrap();
        let update = ListingUpdate {
            price: Some(i64::MAX),
            loan_balance: Some(-1),
            ..Default::default()
        };
        assert!(update.apply(fields.clone()).is_err());

        let update = ListingUpdate {
            price: Some(i64::MIN),
            loan_balance: Some(i64::MAX),
            ..Default::default()
        };
        assert!(update.apply(fields).is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(
            slugify("Charming Colonial San Diego CA"),
            "charming-colonial-san-diego-ca"
        );
        assert_eq!(slugify("  123 Oak St. #4, Austin TX "), "123-oak-st-4-austin-tx");
        assert_eq!(slugify("!!!"), "listing");
    }

    #[test]
    fn test_slug_base_prefers_explicit_slug_then_title() {
        let mut listing = new_listing();
        assert_eq!(listing.slug_base(), "123-oak-street-san-diego-ca");

        listing.title = Some("Charming Colonial".to_string());
        assert_eq!(listing.slug_base(), "charming-colonial-san-diego-ca");

        listing.slug = Some("My Custom Slug".to_string());
        assert_eq!(listing.slug_base(), "my-custom-slug");
    }

    #[test]
    fn test_slug_candidates() {
        assert_eq!(slug_candidate("oak-street", 0), "oak-street");
        assert_eq!(slug_candidate("oak-street", 1), "oak-street-2");
        assert_eq!(slug_candidate("oak-street", 4), "oak-street-5");
    }

    #[test]
    fn test_defaults_on_create() {
        let fields = new_listing().into_fields(today()).unwrap();
        assert_eq!(fields.status, ListingStatus::Active);
        assert_eq!(fields.listing_date, today());
        assert_eq!(fields.equity, 200000);
        assert_eq!(fields.amenities, vec!["Garage".to_string()]);
    }

    #[test]
    fn test_equity_never_negative() {
        let mut listing = new_listing();
        listing.price = 400000;
        let fields = listing.into_fields(today()).unwrap();
        assert_eq!(fields.equity, 0);
    }

    #[test]
    fn test_validation_rejects_bad_payloads() {
        let cases: [(fn(&mut NewListing), &str); 9] = [
            (|l| l.address = "  ".to_string(), "Address is required."),
            (|l| l.zip_code = String::new(), "Zip code is required."),
            (|l| l.price = -1, "Price must not be negative."),
            (|l| l.beds = -1, "Beds must not be negative."),
            (|l| l.baths = -0.5, "Baths must not be negative."),
            (
                |l| l.assumable_rate = 26.0,
                "Assumable rate must be between 0 and 25 percent.",
            ),
            (
                |l| l.assumable_rate = -0.1,
                "Assumable rate must be between 0 and 25 percent.",
            ),
            (
                |l| l.status = Some("rented".to_string()),
                "Status must be one of active, pending, sold or archived.",
            ),
            (|l| l.primary_image = String::new(), "A primary image is required."),
        ];

        for (mutate, expected) in cases {
            let mut listing = new_listing();
            mutate(&mut listing);
            assert_eq!(listing.into_fields(today()).unwrap_err(), expected);
        }
    }

    #[test]
    fn test_validation_rejects_traversal_image_paths() {
        let mut listing = new_listing();
        listing.images = vec!["properties/../profiles/x/profile.jpg".to_string()];
        assert!(listing.into_fields(today()).is_err());

        let mut listing = new_listing();
        listing.images = vec!["https://images.unsplash.com/photo-1?w=800".to_string()];
        assert!(listing.into_fields(today()).is_ok());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Sold".parse::<ListingStatus>(), Ok(ListingStatus::Sold));
        assert!("rented".parse::<ListingStatus>().is_err());
    }

    #[test]
    fn test_update_is_partial() {
        let listing = listing();
        let update = ListingUpdate {
            status: Some("pending".to_string()),
            description: Some(String::new()),
            ..Default::default()
        };

        let fields = update.apply(listing.fields()).unwrap();
        assert_eq!(fields.status, ListingStatus::Pending);
        assert_eq!(fields.description, None);
        assert_eq!(fields.address, listing.address);
        assert_eq!(fields.equity, listing.equity);
    }

    #[test]
    fn test_update_recomputes_equity() {
        let update = ListingUpdate {
            price: Some(700000),
            ..Default::default()
        };
        let fields = update.apply(listing().fields()).unwrap();
        assert_eq!(fields.equity, 250000);
    }

    #[test]
    fn test_update_validates_result() {
        let update = ListingUpdate {
            assumable_rate: Some(30.0),
            ..Default::default()
        };
        assert!(update.apply(listing().fields()).is_err());
    }

    #[test]
    fn test_metadata() {
        let metadata = listing().metadata();
        assert_eq!(metadata.title, "123 Oak Street - San Diego, CA | ValorHomes");
        assert_eq!(
            metadata.description,
            "3 bed, 2 bath home in San Diego, CA. VA loan assumable at 2.75%. Beautiful colonial-style home."
        );
    }

    #[test]
    fn test_metadata_truncates_description() {
        let mut listing = listing();
        listing.baths = 2.5;
        listing.description = Some("x".repeat(400));
        let metadata = listing.metadata();
        assert!(metadata.description.starts_with("3 bed, 2.5 bath home"));
        assert!(metadata.description.ends_with(&"x".repeat(150)));
        assert!(!metadata.description.ends_with(&"x".repeat(151)));

        listing.description = None;
        assert!(listing.metadata().description.ends_with("assumable at 2.75%."));
    }

    #[test]
    fn test_listed_within() {
        assert_eq!(
            ListedWithin::Week.since(today()),
            NaiveDate::from_ymd_opt(2025, 9, 24).unwrap()
        );
        assert_eq!(
            ListedWithin::Month.since(today()),
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
        );
    }

    #[test]
    fn test_query_filter() {
        let query = ListingQuery {
            state: Some(" ca ".to_string()),
            max_price: Some(700000),
            min_beds: Some(3),
            listed_within: Some(ListedWithin::Day),
            ..Default::default()
        };
        assert_eq!(
            query.filter(today()),
            ListingFilter {
                state: Some("CA".to_string()),
                max_price: Some(700000),
                min_beds: Some(3),
                listed_since: NaiveDate::from_ymd_opt(2025, 9, 30),
            }
        );
        assert_eq!(ListingQuery::default().filter(today()), ListingFilter::default());
    }

    #[test]
    fn test_payment_display() {
        let listing = listing();
        let comparison = listing.payment_comparison(7.0, 30);
        let display = PaymentDisplay::new(&listing, &comparison);
        assert_eq!(display.price, "$650,000");
        assert_eq!(display.equity_needed, "$200,000");
        assert_eq!(display.market_payment, "$2,994/mo");
        assert_eq!(display.assumable_payment, "$1,837/mo");
        assert_eq!(display.monthly_savings, "$1,157/mo");
    }
}
