use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{Error, Result};
use crate::models::job_application::{
    ApplicationStatus, JobApplication, NewJobApplication, ReviewOutcome, ReviewUpdate,
};
use crate::models::job_offer::{JobOffer, JobOfferChanges, NewJobOffer};
use crate::models::user::{NewUser, PasswordResetToken, Role, User};
use crate::repositories::{JobApplicationRepository, JobOfferRepository, UserRepository};
use crate::utils::time::now;

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    job_offers: BTreeMap<i64, JobOffer>,
    job_applications: BTreeMap<i64, JobApplication>,
    reset_tokens: BTreeMap<String, PasswordResetToken>,
    next_user_id: i64,
    next_job_offer_id: i64,
    next_job_application_id: i64,
}

impl Tables {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// In-process store backing all repositories; cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }
}

fn newest_first<T, F>(mut items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (DateTime<Utc>, i64),
{
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

fn offer_key(offer: &JobOffer) -> (DateTime<Utc>, i64) {
    (offer.created_at, offer.id)
}

fn application_key(application: &JobApplication) -> (DateTime<Utc>, i64) {
    (application.created_at, application.id)
}

#[async_trait]
impl JobOfferRepository for MemoryStore {
    async fn find(&self, id: i64) -> Result<Option<JobOffer>> {
        Ok(self.read()?.job_offers.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<JobOffer>> {
        let offers = self.read()?.job_offers.values().cloned().collect();
        Ok(newest_first(offers, offer_key))
    }

    async fn list_active(&self, today: NaiveDate) -> Result<Vec<JobOffer>> {
        let offers = self
            .read()?
            .job_offers
            .values()
            .filter(|offer| offer.is_open_on(today))
            .cloned()
            .collect();
        Ok(newest_first(offers, offer_key))
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<JobOffer>> {
        let offers = self
            .read()?
            .job_offers
            .values()
            .filter(|offer| offer.user_id == owner_id)
            .cloned()
            .collect();
        Ok(newest_first(offers, offer_key))
    }

    async fn create(&self, offer: NewJobOffer) -> Result<JobOffer> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&offer.user_id) {
            return Err(Error::BadRequest(format!("Unknown user {}", offer.user_id)));
        }
        let id = Tables::next_id(&mut tables.next_job_offer_id);
        let stamp = now();
        let created = JobOffer {
            id,
            title: offer.title,
            description: offer.description,
            location: offer.location,
            company_name: offer.company_name,
            contract_type: offer.contract_type,
            salary_min: offer.salary_min,
            salary_max: offer.salary_max,
            is_active: offer.is_active,
            expires_at: offer.expires_at,
            requirements: offer.requirements,
            benefits: offer.benefits,
            user_id: offer.user_id,
            created_at: stamp,
            updated_at: stamp,
        };
        tables.job_offers.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, changes: JobOfferChanges) -> Result<Option<JobOffer>> {
        let mut tables = self.write()?;
        let Some(offer) = tables.job_offers.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(offer);
        offer.updated_at = now();
        Ok(Some(offer.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tables = self.write()?;
        if tables.job_offers.remove(&id).is_none() {
            return Ok(false);
        }
        tables
            .job_applications
            .retain(|_, application| application.job_offer_id != id);
        Ok(true)
    }
}

#[async_trait]
impl JobApplicationRepository for MemoryStore {
    async fn find(&self, id: i64) -> Result<Option<JobApplication>> {
        Ok(self.read()?.job_applications.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<JobApplication>> {
        let applications = self.read()?.job_applications.values().cloned().collect();
        Ok(newest_first(applications, application_key))
    }

    async fn list_by_job_offer(&self, job_offer_id: i64) -> Result<Vec<JobApplication>> {
        let applications = self
            .read()?
            .job_applications
            .values()
            .filter(|application| application.job_offer_id == job_offer_id)
            .cloned()
            .collect();
        Ok(newest_first(applications, application_key))
    }

    async fn list_by_job_offers(&self, job_offer_ids: &[i64]) -> Result<Vec<JobApplication>> {
        let applications = self
            .read()?
            .job_applications
            .values()
            .filter(|application| job_offer_ids.contains(&application.job_offer_id))
            .cloned()
            .collect();
        Ok(newest_first(applications, application_key))
    }

    async fn list_by_candidate(&self, user_id: i64) -> Result<Vec<JobApplication>> {
        let applications = self
            .read()?
            .job_applications
            .values()
            .filter(|application| application.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(applications, application_key))
    }

    async fn list_recent(&self, limit: i64, offer_owner: Option<i64>) -> Result<Vec<JobApplication>> {
        let tables = self.read()?;
        let applications = tables
            .job_applications
            .values()
            .filter(|application| match offer_owner {
                None => true,
                Some(owner) => tables
                    .job_offers
                    .get(&application.job_offer_id)
                    .map_or(false, |offer| offer.user_id == owner),
            })
            .cloned()
            .collect();
        let mut applications = newest_first(applications, application_key);
        applications.truncate(usize::try_from(limit.max(0)).unwrap_or(0));
        Ok(applications)
    }

    async fn exists_for(&self, user_id: i64, job_offer_id: i64) -> Result<bool> {
        Ok(self
            .read()?
            .job_applications
            .values()
            .any(|a| a.user_id == user_id && a.job_offer_id == job_offer_id))
    }

    async fn create(&self, application: NewJobApplication) -> Result<JobApplication> {
        let mut tables = self.write()?;
        if !tables.job_offers.contains_key(&application.job_offer_id) {
            return Err(Error::BadRequest(format!(
                "Unknown job offer {}",
                application.job_offer_id
            )));
        }
        let duplicate = tables.job_applications.values().any(|a| {
            a.user_id == application.user_id && a.job_offer_id == application.job_offer_id
        });
        if duplicate {
            return Err(Error::Conflict(
                "Candidate has already applied to this job offer".to_string(),
            ));
        }
        let id = Tables::next_id(&mut tables.next_job_application_id);
        let stamp = now();
        let created = JobApplication {
            id,
            job_offer_id: application.job_offer_id,
            user_id: application.user_id,
            status: ApplicationStatus::Pending,
            cover_letter: application.cover_letter,
            cv_path: application.cv_path,
            recruiter_notes: None,
            last_status_change: Some(application.submitted_at),
            created_at: stamp,
            updated_at: stamp,
        };
        tables.job_applications.insert(id, created.clone());
        Ok(created)
    }

    async fn update_review(&self, id: i64, update: ReviewUpdate) -> Result<Option<ReviewOutcome>> {
        let mut tables = self.write()?;
        let Some(application) = tables.job_applications.get_mut(&id) else {
            return Ok(None);
        };
        let previous_status = application.status;
        application.status = update.status;
        if let Some(notes) = update.notes {
            application.recruiter_notes = Some(notes);
        }
        application.last_status_change = Some(match application.last_status_change {
            Some(previous) if previous > update.changed_at => previous,
            _ => update.changed_at,
        });
        application.updated_at = now();
        Ok(Some(ReviewOutcome {
            previous_status,
            application: application.clone(),
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.write()?.job_applications.remove(&id).is_some())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find(&self, id: i64) -> Result<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let mut tables = self.write()?;
        if tables
            .users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(Error::Conflict("The email has already been taken.".to_string()));
        }
        let id = Tables::next_id(&mut tables.next_user_id);
        let stamp = now();
        let created = User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: stamp,
            updated_at: stamp,
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn count_by_role(&self, role: Role) -> Result<i64> {
        let count = self
            .read()?
            .users
            .values()
            .filter(|user| user.role == role)
            .count();
        Ok(count as i64)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        let mut tables = self.write()?;
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(false);
        };
        user.password_hash = password_hash.to_string();
        user.updated_at = now();
        Ok(true)
    }

    async fn store_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let email = email.to_ascii_lowercase();
        self.write()?.reset_tokens.insert(
            email.clone(),
            PasswordResetToken {
                email,
                token_hash: token_hash.to_string(),
                expires_at,
                created_at: now(),
            },
        );
        Ok(())
    }

    async fn find_reset_token(&self, email: &str) -> Result<Option<PasswordResetToken>> {
        Ok(self
            .read()?
            .reset_tokens
            .get(&email.to_ascii_lowercase())
            .cloned())
    }

    async fn delete_reset_token(&self, email: &str) -> Result<()> {
        self.write()?.reset_tokens.remove(&email.to_ascii_lowercase());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed(store: &MemoryStore) -> (User, User, JobOffer) {
        let recruiter = UserRepository::create(
            store,
            NewUser {
                name: "Rita".into(),
                email: "rita@example.com".into(),
                password_hash: "x".into(),
                role: Role::Recruiter,
            },
        )
        .await
        .unwrap();
        let candidate = UserRepository::create(
            store,
            NewUser {
                name: "Carl".into(),
                email: "carl@example.com".into(),
                password_hash: "x".into(),
                role: Role::Candidate,
            },
        )
        .await
        .unwrap();
        let offer = JobOfferRepository::create(
            store,
            NewJobOffer {
                title: "Rust developer".into(),
                description: "APIs".into(),
                location: None,
                company_name: "Acme".into(),
                contract_type: "CDI".into(),
                salary_min: None,
                salary_max: None,
                is_active: true,
                expires_at: None,
                requirements: None,
                benefits: None,
                user_id: recruiter.id,
            },
        )
        .await
        .unwrap();
        (recruiter, candidate, offer)
    }

    fn application(offer: &JobOffer, candidate: &User) -> NewJobApplication {
        NewJobApplication {
            job_offer_id: offer.id,
            user_id: candidate.id,
            cover_letter: None,
            cv_path: None,
            submitted_at: now(),
        }
    }

    #[tokio::test]
    async fn second_application_for_same_pair_conflicts() {
        let store = MemoryStore::new();
        let (_, candidate, offer) = seed(&store).await;

        JobApplicationRepository::create(&store, application(&offer, &candidate))
            .await
            .unwrap();
        let second = JobApplicationRepository::create(&store, application(&offer, &candidate)).await;

        assert!(matches!(second, Err(Error::Conflict(_))));
        assert_eq!(
            JobApplicationRepository::list_by_candidate(&store, candidate.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn deleting_offer_cascades_to_applications() {
        let store = MemoryStore::new();
        let (_, candidate, offer) = seed(&store).await;
        let created = JobApplicationRepository::create(&store, application(&offer, &candidate))
            .await
            .unwrap();

        assert!(JobOfferRepository::delete(&store, offer.id).await.unwrap());
        assert!(JobApplicationRepository::find(&store, created.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn review_stamp_never_moves_backwards() {
        let store = MemoryStore::new();
        let (_, candidate, offer) = seed(&store).await;
        let created = JobApplicationRepository::create(&store, application(&offer, &candidate))
            .await
            .unwrap();
        let first_stamp = created.last_status_change.unwrap();

        let outcome = store
            .update_review(
                created.id,
                ReviewUpdate {
                    status: ApplicationStatus::Reviewing,
                    notes: Some("Strong profile".into()),
                    changed_at: first_stamp - chrono::Duration::seconds(30),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.previous_status, ApplicationStatus::Pending);
        assert_eq!(outcome.application.status, ApplicationStatus::Reviewing);
        assert_eq!(outcome.application.last_status_change, Some(first_stamp));
        assert_eq!(
            outcome.application.recruiter_notes.as_deref(),
            Some("Strong profile")
        );
    }
}
