use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dto::job_offer_dto::{CreateJobOfferPayload, UpdateJobOfferPayload};
use crate::error::Result;
use crate::models::caller::Caller;
use crate::models::job_offer::{JobOffer, JobOfferChanges};
use crate::repositories::JobOfferRepository;
use crate::utils::time::today;
use crate::utils::validation::field_error;

#[derive(Clone)]
pub struct JobOfferService {
    offers: Arc<dyn JobOfferRepository>,
}

/// Result of looking up a single offer on behalf of a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum OfferLookup {
    Visible(JobOffer),
    /// Exists, but is closed and the caller neither owns it nor is admin.
    Hidden,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferStatistics {
    pub total_offers: i64,
    pub active_offers: i64,
    pub expired_offers: i64,
}

impl OfferStatistics {
    pub fn tally(offers: &[JobOffer]) -> Self {
        let today = today();
        Self {
            total_offers: offers.len() as i64,
            active_offers: offers.iter().filter(|o| o.is_open_on(today)).count() as i64,
            expired_offers: offers.iter().filter(|o| o.is_expired_on(today)).count() as i64,
        }
    }
}

impl JobOfferService {
    pub fn new(offers: Arc<dyn JobOfferRepository>) -> Self {
        Self { offers }
    }

    /// Recruiters see everything they posted; everyone else sees open offers.
    pub async fn list_for_caller(&self, caller: &Caller) -> Result<Vec<JobOffer>> {
        match caller {
            Caller::Recruiter(id) => self.offers.list_by_owner(*id).await,
            Caller::Admin(_) | Caller::Candidate(_) => self.offers.list_active(today()).await,
        }
    }

    pub async fn find_for_caller(&self, caller: &Caller, id: i64) -> Result<OfferLookup> {
        let Some(offer) = self.offers.find(id).await? else {
            return Ok(OfferLookup::Missing);
        };
        if offer.is_open_on(today()) || caller.can_manage_offer_of(offer.user_id) {
            Ok(OfferLookup::Visible(offer))
        } else {
            Ok(OfferLookup::Hidden)
        }
    }

    pub async fn create(
        &self,
        caller: &Caller,
        payload: CreateJobOfferPayload,
    ) -> Result<Option<JobOffer>> {
        let Caller::Recruiter(owner_id) = *caller else {
            tracing::debug!(?caller, "Job offer creation denied");
            return Ok(None);
        };

        let offer = self.offers.create(payload.into_new_offer(owner_id)).await?;
        tracing::info!(job_offer_id = offer.id, owner_id, "Job offer created");
        Ok(Some(offer))
    }

    /// Partial update by the owning recruiter or an admin.
    pub async fn update(
        &self,
        caller: &Caller,
        id: i64,
        payload: UpdateJobOfferPayload,
    ) -> Result<Option<JobOffer>> {
        let Some(existing) = self.authorized_offer(caller, id).await? else {
            return Ok(None);
        };

        let changes = JobOfferChanges::from(payload);
        let salary_min = changes.salary_min.unwrap_or(existing.salary_min);
        let salary_max = changes.salary_max.unwrap_or(existing.salary_max);
        if let (Some(min), Some(max)) = (salary_min, salary_max) {
            if max < min {
                return Err(field_error(
                    "salary_max",
                    "gte",
                    "The salary max must be greater than or equal to salary min.",
                ));
            }
        }

        let updated = self.offers.update(id, changes).await?;
        if updated.is_some() {
            tracing::info!(job_offer_id = id, caller_id = caller.user_id(), "Job offer updated");
        }
        Ok(updated)
    }

    /// Hard delete; the offer's applications are removed with it.
    pub async fn delete(&self, caller: &Caller, id: i64) -> Result<bool> {
        if self.authorized_offer(caller, id).await?.is_none() {
            return Ok(false);
        }
        let deleted = self.offers.delete(id).await?;
        if deleted {
            tracing::info!(job_offer_id = id, caller_id = caller.user_id(), "Job offer deleted");
        }
        Ok(deleted)
    }

    /// Counts for one recruiter (the caller by default). Admins without a
    /// recruiter id get platform-wide counts.
    pub async fn statistics(
        &self,
        caller: &Caller,
        recruiter_id: Option<i64>,
    ) -> Result<Option<OfferStatistics>> {
        let offers = match (*caller, recruiter_id) {
            (Caller::Recruiter(id), None) => self.offers.list_by_owner(id).await?,
            (Caller::Recruiter(id), Some(requested)) if requested == id => {
                self.offers.list_by_owner(id).await?
            }
            (Caller::Admin(_), Some(requested)) => self.offers.list_by_owner(requested).await?,
            (Caller::Admin(_), None) => self.offers.list_all().await?,
            _ => return Ok(None),
        };
        Ok(Some(OfferStatistics::tally(&offers)))
    }

    async fn authorized_offer(&self, caller: &Caller, id: i64) -> Result<Option<JobOffer>> {
        match self.offers.find(id).await? {
            Some(offer) if caller.can_manage_offer_of(offer.user_id) => Ok(Some(offer)),
            _ => {
                tracing::debug!(job_offer_id = id, ?caller, "Job offer access denied");
                Ok(None)
            }
        }
    }
}
