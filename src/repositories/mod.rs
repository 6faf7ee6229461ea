//! Data access layer: one repository per entity, no business rules.
//!
//! Every trait has a PostgreSQL implementation (`postgres`) and an in-process
//! one (`memory`) with identical semantics, including the uniqueness of
//! (candidate, offer) applications and cascading deletes.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::error::Result;
use crate::models::job_application::{JobApplication, NewJobApplication, ReviewOutcome, ReviewUpdate};
use crate::models::job_offer::{JobOffer, JobOfferChanges, NewJobOffer};
use crate::models::user::{NewUser, PasswordResetToken, Role, User};

#[async_trait]
pub trait JobOfferRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<JobOffer>>;

    async fn list_all(&self) -> Result<Vec<JobOffer>>;

    /// Offers flagged active whose expiry is unset or not before `today`.
    async fn list_active(&self, today: NaiveDate) -> Result<Vec<JobOffer>>;

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<JobOffer>>;

    async fn create(&self, offer: NewJobOffer) -> Result<JobOffer>;

    async fn update(&self, id: i64, changes: JobOfferChanges) -> Result<Option<JobOffer>>;

    /// Hard delete; applications to the offer go with it.
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait JobApplicationRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<JobApplication>>;

    async fn list_all(&self) -> Result<Vec<JobApplication>>;

    async fn list_by_job_offer(&self, job_offer_id: i64) -> Result<Vec<JobApplication>>;

    async fn list_by_job_offers(&self, job_offer_ids: &[i64]) -> Result<Vec<JobApplication>>;

    async fn list_by_candidate(&self, user_id: i64) -> Result<Vec<JobApplication>>;

    /// Newest first; `offer_owner` restricts to offers posted by that recruiter.
    async fn list_recent(&self, limit: i64, offer_owner: Option<i64>) -> Result<Vec<JobApplication>>;

    async fn exists_for(&self, user_id: i64, job_offer_id: i64) -> Result<bool>;

    /// Fails with `Error::Conflict` when the candidate already applied.
    async fn create(&self, application: NewJobApplication) -> Result<JobApplication>;

    /// Writes status, optional notes and the status stamp as one unit.
    async fn update_review(&self, id: i64, update: ReviewUpdate) -> Result<Option<ReviewOutcome>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Fails with `Error::Conflict` when the e-mail is taken.
    async fn create(&self, user: NewUser) -> Result<User>;

    async fn count_by_role(&self, role: Role) -> Result<i64>;

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool>;

    /// Replaces any pending reset token for the e-mail.
    async fn store_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn find_reset_token(&self, email: &str) -> Result<Option<PasswordResetToken>>;

    async fn delete_reset_token(&self, email: &str) -> Result<()>;
}

/// Repository handles shared by the services.
#[derive(Clone)]
pub struct Repositories {
    pub job_offers: Arc<dyn JobOfferRepository>,
    pub job_applications: Arc<dyn JobApplicationRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            job_offers: Arc::new(postgres::PgJobOfferRepository::new(pool.clone())),
            job_applications: Arc::new(postgres::PgJobApplicationRepository::new(pool.clone())),
            users: Arc::new(postgres::PgUserRepository::new(pool)),
        }
    }

    pub fn in_memory(store: memory::MemoryStore) -> Self {
        Self {
            job_offers: Arc::new(store.clone()),
            job_applications: Arc::new(store.clone()),
            users: Arc::new(store),
        }
    }
}
