use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::job_application::{
    ApplicationStatus, JobApplication, NewJobApplication, ReviewOutcome, ReviewUpdate,
};
use crate::models::job_offer::{JobOffer, JobOfferChanges, NewJobOffer};
use crate::models::user::{NewUser, PasswordResetToken, Role, User};
use crate::repositories::{JobApplicationRepository, JobOfferRepository, UserRepository};

const JOB_OFFER_COLUMNS: &str = "id, title, description, location, company_name, contract_type, salary_min, salary_max, is_active, expires_at, requirements, benefits, user_id, created_at, updated_at";

const JOB_APPLICATION_COLUMNS: &str = "id, job_offer_id, user_id, status, cover_letter, cv_path, recruiter_notes, last_status_change, created_at, updated_at";

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

fn unique_violation_as_conflict(err: sqlx::Error, message: &str) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::Conflict(message.to_string()),
        _ => Error::from(err),
    }
}

#[derive(Clone)]
pub struct PgJobOfferRepository {
    pool: PgPool,
}

impl PgJobOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobOfferRepository for PgJobOfferRepository {
    async fn find(&self, id: i64) -> Result<Option<JobOffer>> {
        let query = format!("SELECT {} FROM job_offers WHERE id = $1", JOB_OFFER_COLUMNS);
        let offer = sqlx::query_as::<_, JobOffer>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(offer)
    }

    async fn list_all(&self) -> Result<Vec<JobOffer>> {
        let query = format!(
            "SELECT {} FROM job_offers ORDER BY created_at DESC, id DESC",
            JOB_OFFER_COLUMNS
        );
        let offers = sqlx::query_as::<_, JobOffer>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(offers)
    }

    async fn list_active(&self, today: NaiveDate) -> Result<Vec<JobOffer>> {
        let query = format!(
            "SELECT {}
             FROM job_offers
             WHERE is_active = TRUE
               AND (expires_at IS NULL OR expires_at >= $1)
             ORDER BY created_at DESC, id DESC",
            JOB_OFFER_COLUMNS
        );
        let offers = sqlx::query_as::<_, JobOffer>(&query)
            .bind(today)
            .fetch_all(&self.pool)
            .await?;
        Ok(offers)
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<JobOffer>> {
        let query = format!(
            "SELECT {} FROM job_offers WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            JOB_OFFER_COLUMNS
        );
        let offers = sqlx::query_as::<_, JobOffer>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(offers)
    }

    async fn create(&self, offer: NewJobOffer) -> Result<JobOffer> {
        let query = format!(
            r#"
            INSERT INTO job_offers (
                title, description, location, company_name, contract_type,
                salary_min, salary_max, is_active, expires_at, requirements,
                benefits, user_id
            ) VALUES (
                $1,$2,$3,$4,$5,
                $6,$7,$8,$9,$10,
                $11,$12
            )
            RETURNING {}
            "#,
            JOB_OFFER_COLUMNS
        );
        let created = sqlx::query_as::<_, JobOffer>(&query)
            .bind(offer.title)
            .bind(offer.description)
            .bind(offer.location)
            .bind(offer.company_name)
            .bind(offer.contract_type)
            .bind(offer.salary_min)
            .bind(offer.salary_max)
            .bind(offer.is_active)
            .bind(offer.expires_at)
            .bind(offer.requirements)
            .bind(offer.benefits)
            .bind(offer.user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update(&self, id: i64, changes: JobOfferChanges) -> Result<Option<JobOffer>> {
        let query = format!(
            r#"
            UPDATE job_offers
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = CASE WHEN $4 THEN $5 ELSE location END,
                company_name = COALESCE($6, company_name),
                contract_type = COALESCE($7, contract_type),
                salary_min = CASE WHEN $8 THEN $9 ELSE salary_min END,
                salary_max = CASE WHEN $10 THEN $11 ELSE salary_max END,
                is_active = COALESCE($12, is_active),
                expires_at = CASE WHEN $13 THEN $14 ELSE expires_at END,
                requirements = CASE WHEN $15 THEN $16 ELSE requirements END,
                benefits = CASE WHEN $17 THEN $18 ELSE benefits END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            JOB_OFFER_COLUMNS
        );
        let updated = sqlx::query_as::<_, JobOffer>(&query)
            .bind(id)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.location.is_some())
            .bind(changes.location.flatten())
            .bind(changes.company_name)
            .bind(changes.contract_type)
            .bind(changes.salary_min.is_some())
            .bind(changes.salary_min.flatten())
            .bind(changes.salary_max.is_some())
            .bind(changes.salary_max.flatten())
            .bind(changes.is_active)
            .bind(changes.expires_at.is_some())
            .bind(changes.expires_at.flatten())
            .bind(changes.requirements.is_some())
            .bind(changes.requirements.flatten())
            .bind(changes.benefits.is_some())
            .bind(changes.benefits.flatten())
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let res = sqlx::query("DELETE FROM job_offers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgJobApplicationRepository {
    pool: PgPool,
}

impl PgJobApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobApplicationRepository for PgJobApplicationRepository {
    async fn find(&self, id: i64) -> Result<Option<JobApplication>> {
        let query = format!(
            "SELECT {} FROM job_applications WHERE id = $1",
            JOB_APPLICATION_COLUMNS
        );
        let application = sqlx::query_as::<_, JobApplication>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(application)
    }

    async fn list_all(&self) -> Result<Vec<JobApplication>> {
        let query = format!(
            "SELECT {} FROM job_applications ORDER BY created_at DESC, id DESC",
            JOB_APPLICATION_COLUMNS
        );
        let applications = sqlx::query_as::<_, JobApplication>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(applications)
    }

    async fn list_by_job_offer(&self, job_offer_id: i64) -> Result<Vec<JobApplication>> {
        let query = format!(
            "SELECT {} FROM job_applications WHERE job_offer_id = $1 ORDER BY created_at DESC, id DESC",
            JOB_APPLICATION_COLUMNS
        );
        let applications = sqlx::query_as::<_, JobApplication>(&query)
            .bind(job_offer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(applications)
    }

    async fn list_by_job_offers(&self, job_offer_ids: &[i64]) -> Result<Vec<JobApplication>> {
        if job_offer_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {} FROM job_applications WHERE job_offer_id = ANY($1) ORDER BY created_at DESC, id DESC",
            JOB_APPLICATION_COLUMNS
        );
        let applications = sqlx::query_as::<_, JobApplication>(&query)
            .bind(job_offer_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(applications)
    }

    async fn list_by_candidate(&self, user_id: i64) -> Result<Vec<JobApplication>> {
        let query = format!(
            "SELECT {} FROM job_applications WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            JOB_APPLICATION_COLUMNS
        );
        let applications = sqlx::query_as::<_, JobApplication>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(applications)
    }

    async fn list_recent(&self, limit: i64, offer_owner: Option<i64>) -> Result<Vec<JobApplication>> {
        let applications = sqlx::query_as::<_, JobApplication>(
            r#"
            SELECT a.id, a.job_offer_id, a.user_id, a.status, a.cover_letter, a.cv_path,
                   a.recruiter_notes, a.last_status_change, a.created_at, a.updated_at
            FROM job_applications a
            JOIN job_offers o ON o.id = a.job_offer_id
            WHERE ($2::BIGINT IS NULL OR o.user_id = $2)
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(offer_owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    async fn exists_for(&self, user_id: i64, job_offer_id: i64) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM job_applications WHERE user_id = $1 AND job_offer_id = $2)",
        )
        .bind(user_id)
        .bind(job_offer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, application: NewJobApplication) -> Result<JobApplication> {
        let query = format!(
            r#"
            INSERT INTO job_applications (
                job_offer_id, user_id, status, cover_letter, cv_path, last_status_change
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            JOB_APPLICATION_COLUMNS
        );
        sqlx::query_as::<_, JobApplication>(&query)
            .bind(application.job_offer_id)
            .bind(application.user_id)
            .bind(ApplicationStatus::Pending)
            .bind(application.cover_letter)
            .bind(application.cv_path)
            .bind(application.submitted_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_violation_as_conflict(e, "Candidate has already applied to this job offer"))
    }

    async fn update_review(&self, id: i64, update: ReviewUpdate) -> Result<Option<ReviewOutcome>> {
        let mut tx = self.pool.begin().await?;

        let previous_status = sqlx::query_scalar::<_, ApplicationStatus>(
            "SELECT status FROM job_applications WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(previous_status) = previous_status else {
            return Ok(None);
        };

        let query = format!(
            r#"
            UPDATE job_applications
            SET
                status = $2,
                recruiter_notes = COALESCE($3, recruiter_notes),
                last_status_change = GREATEST(COALESCE(last_status_change, $4), $4),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            JOB_APPLICATION_COLUMNS
        );
        let application = sqlx::query_as::<_, JobApplication>(&query)
            .bind(id)
            .bind(update.status)
            .bind(update.notes)
            .bind(update.changed_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(ReviewOutcome {
            previous_status,
            application,
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let res = sqlx::query("DELETE FROM job_applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find(&self, id: i64) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE LOWER(email) = LOWER($1)", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_violation_as_conflict(e, "The email has already been taken."))
    }

    async fn count_by_role(&self, role: Role) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        let res = sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn store_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (email, token_hash, expires_at)
            VALUES (LOWER($1), $2, $3)
            ON CONFLICT (email) DO UPDATE
            SET token_hash = EXCLUDED.token_hash,
                expires_at = EXCLUDED.expires_at,
                created_at = NOW()
            "#,
        )
        .bind(email)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_reset_token(&self, email: &str) -> Result<Option<PasswordResetToken>> {
        let token = sqlx::query_as::<_, PasswordResetToken>(
            "SELECT email, token_hash, expires_at, created_at FROM password_reset_tokens WHERE email = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn delete_reset_token(&self, email: &str) -> Result<()> {
        sqlx::query("DELETE FROM password_reset_tokens WHERE email = LOWER($1)")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
