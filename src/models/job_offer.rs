use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct JobOffer {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub company_name: String,
    pub contract_type: String,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub is_active: bool,
    pub expires_at: Option<NaiveDate>,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    /// Recruiter who posted the offer.
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobOffer {
    /// Flagged active and not past its expiry date.
    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        self.is_active && self.expires_at.map_or(true, |date| date >= today)
    }

    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.expires_at.map_or(false, |date| date < today)
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewJobOffer {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub company_name: String,
    pub contract_type: String,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub is_active: bool,
    pub expires_at: Option<NaiveDate>,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub user_id: i64,
}

/// Partial update: `None` leaves the stored value untouched. Nullable columns
/// use `Some(None)` to clear the stored value.
#[derive(Debug, Clone, Default)]
pub struct JobOfferChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<Option<String>>,
    pub company_name: Option<String>,
    pub contract_type: Option<String>,
    pub salary_min: Option<Option<Decimal>>,
    pub salary_max: Option<Option<Decimal>>,
    pub is_active: Option<bool>,
    pub expires_at: Option<Option<NaiveDate>>,
    pub requirements: Option<Option<String>>,
    pub benefits: Option<Option<String>>,
}

impl JobOfferChanges {
    pub fn apply_to(&self, offer: &mut JobOffer) {
        if let Some(title) = &self.title {
            offer.title = title.clone();
        }
        if let Some(description) = &self.description {
            offer.description = description.clone();
        }
        if let Some(location) = &self.location {
            offer.location = location.clone();
        }
        if let Some(company_name) = &self.company_name {
            offer.company_name = company_name.clone();
        }
        if let Some(contract_type) = &self.contract_type {
            offer.contract_type = contract_type.clone();
        }
        if let Some(salary_min) = self.salary_min {
            offer.salary_min = salary_min;
        }
        if let Some(salary_max) = self.salary_max {
            offer.salary_max = salary_max;
        }
        if let Some(is_active) = self.is_active {
            offer.is_active = is_active;
        }
        if let Some(expires_at) = self.expires_at {
            offer.expires_at = expires_at;
        }
        if let Some(requirements) = &self.requirements {
            offer.requirements = requirements.clone();
        }
        if let Some(benefits) = &self.benefits {
            offer.benefits = benefits.clone();
        }
    }
}
