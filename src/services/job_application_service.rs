use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;

use crate::dto::application_dto::{ApplyPayload, ResumeUpload, MAX_NOTES_CHARS};
use crate::error::{Error, Result};
use crate::models::caller::Caller;
use crate::models::job_application::{
    ApplicationDetail, ApplicationStatus, JobApplication, NewJobApplication, ReviewUpdate,
};
use crate::models::job_offer::JobOffer;
use crate::models::user::{Role, UserSummary};
use crate::repositories::{
    JobApplicationRepository, JobOfferRepository, Repositories, UserRepository,
};
use crate::services::notification_service::{StatusChange, StatusChangeNotifier};
use crate::services::resume_storage::ResumeStorage;
use crate::utils::time::{now, today};
use crate::utils::validation::field_error;

/// Outcome of fetching the résumé attached to an application.
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeLookup {
    Available { path: String, data: Bytes },
    NotAttached,
    Denied,
}

#[derive(Clone)]
pub struct JobApplicationService {
    offers: Arc<dyn JobOfferRepository>,
    applications: Arc<dyn JobApplicationRepository>,
    users: Arc<dyn UserRepository>,
    storage: Arc<dyn ResumeStorage>,
    notifier: Arc<dyn StatusChangeNotifier>,
}

/// Whose applications a statistics request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsScope {
    Global,
    Recruiter(i64),
    Candidate(i64),
}

impl StatisticsScope {
    pub fn for_caller(caller: &Caller) -> Self {
        match *caller {
            Caller::Admin(_) => StatisticsScope::Global,
            Caller::Recruiter(id) => StatisticsScope::Recruiter(id),
            Caller::Candidate(id) => StatisticsScope::Candidate(id),
        }
    }

    fn permits(&self, caller: &Caller) -> bool {
        caller.is_admin() || StatisticsScope::for_caller(caller) == *self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub reviewing: i64,
    pub accepted: i64,
    pub rejected: i64,
}

impl StatusCounts {
    pub fn tally<'a>(applications: impl IntoIterator<Item = &'a JobApplication>) -> Self {
        let mut counts = StatusCounts::default();
        for application in applications {
            match application.status {
                ApplicationStatus::Pending => counts.pending += 1,
                ApplicationStatus::Reviewing => counts.reviewing += 1,
                ApplicationStatus::Accepted => counts.accepted += 1,
                ApplicationStatus::Rejected => counts.rejected += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> i64 {
        self.pending + self.reviewing + self.accepted + self.rejected
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferApplicationCount {
    pub title: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalApplicationStatistics {
    pub total_applications: i64,
    pub total_offers: i64,
    pub active_offers: i64,
    pub status_counts: StatusCounts,
    pub total_candidates: i64,
    pub total_recruiters: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecruiterApplicationStatistics {
    pub total_applications: i64,
    pub total_offers: i64,
    pub active_offers: i64,
    pub status_counts: StatusCounts,
    pub offer_application_counts: BTreeMap<i64, OfferApplicationCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateApplicationStatistics {
    pub total_applications: i64,
    pub status_counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApplicationStatistics {
    Global(GlobalApplicationStatistics),
    Recruiter(RecruiterApplicationStatistics),
    Candidate(CandidateApplicationStatistics),
}

impl JobApplicationService {
    pub fn new(
        repositories: &Repositories,
        storage: Arc<dyn ResumeStorage>,
        notifier: Arc<dyn StatusChangeNotifier>,
    ) -> Self {
        Self {
            offers: repositories.job_offers.clone(),
            applications: repositories.job_applications.clone(),
            users: repositories.users.clone(),
            storage,
            notifier,
        }
    }

    /// Submits a candidate's application to an open offer.
    ///
    /// Returns `None` for every refusal: wrong role, unknown or closed offer,
    /// or an existing application for the same pair.
    pub async fn apply(
        &self,
        caller: &Caller,
        job_offer_id: i64,
        payload: ApplyPayload,
        resume: Option<ResumeUpload>,
    ) -> Result<Option<JobApplication>> {
        let Caller::Candidate(candidate_id) = *caller else {
            tracing::debug!(job_offer_id, ?caller, "Application refused for non-candidate");
            return Ok(None);
        };

        let open = self
            .offers
            .find(job_offer_id)
            .await?
            .map_or(false, |offer| offer.is_open_on(today()));
        if !open || self.applications.exists_for(candidate_id, job_offer_id).await? {
            tracing::debug!(job_offer_id, candidate_id, "Application refused");
            return Ok(None);
        }

        let cv_path = match resume {
            Some(upload) => {
                let extension = upload.extension().ok_or_else(|| {
                    field_error("cv", "mimes", "The cv must be a file of type: pdf, doc, docx.")
                })?;
                Some(self.storage.store(candidate_id, &extension, upload.data).await?)
            }
            None => None,
        };

        let new_application = NewJobApplication {
            job_offer_id,
            user_id: candidate_id,
            cover_letter: payload.cover_letter,
            cv_path: cv_path.clone(),
            submitted_at: now(),
        };

        match self.applications.create(new_application).await {
            Ok(application) => {
                tracing::info!(
                    application_id = application.id,
                    job_offer_id,
                    candidate_id,
                    has_cv = application.cv_path.is_some(),
                    "Application submitted"
                );
                Ok(Some(application))
            }
            Err(err) => {
                if let Some(path) = &cv_path {
                    if let Err(cleanup) = self.storage.remove(path).await {
                        tracing::warn!(error = %cleanup, path = %path, "Failed to remove orphaned résumé");
                    }
                }
                match err {
                    Error::Conflict(_) => {
                        tracing::debug!(job_offer_id, candidate_id, "Duplicate application rejected by storage");
                        Ok(None)
                    }
                    other => Err(other),
                }
            }
        }
    }

    /// Deletes an application; only the candidate who submitted it may.
    pub async fn withdraw(&self, caller: &Caller, id: i64) -> Result<bool> {
        let Caller::Candidate(candidate_id) = *caller else {
            return Ok(false);
        };
        let application = match self.applications.find(id).await? {
            Some(application) if application.user_id == candidate_id => application,
            _ => {
                tracing::debug!(application_id = id, ?caller, "Withdrawal denied");
                return Ok(false);
            }
        };

        let deleted = self.applications.delete(id).await?;
        if deleted {
            tracing::info!(application_id = id, candidate_id, "Application withdrawn");
            if let Some(path) = &application.cv_path {
                if let Err(err) = self.storage.remove(path).await {
                    tracing::warn!(error = %err, path = %path, "Failed to remove résumé of withdrawn application");
                }
            }
        }
        Ok(deleted)
    }

    /// Sets status (and notes, when given) in one write, then notifies.
    pub async fn update_status(
        &self,
        caller: &Caller,
        id: i64,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Option<JobApplication>> {
        if notes
            .as_deref()
            .map_or(false, |n| n.chars().count() > MAX_NOTES_CHARS)
        {
            return Err(field_error(
                "notes",
                "length",
                "The notes must not be greater than 1000 characters.",
            ));
        }

        if !self.can_review(caller, id).await? {
            tracing::debug!(application_id = id, ?caller, "Status update denied");
            return Ok(None);
        }

        let update = ReviewUpdate {
            status,
            notes,
            changed_at: now(),
        };
        let Some(outcome) = self.applications.update_review(id, update).await? else {
            return Ok(None);
        };

        let application = outcome.application;
        tracing::info!(
            application_id = id,
            previous = %outcome.previous_status,
            current = %application.status,
            caller_id = caller.user_id(),
            "Application status updated"
        );

        let change = StatusChange {
            application_id: application.id,
            job_offer_id: application.job_offer_id,
            candidate_id: application.user_id,
            previous: outcome.previous_status,
            current: application.status,
            changed_at: application.last_status_change.unwrap_or(application.updated_at),
        };
        if let Err(err) = self.notifier.status_changed(change).await {
            tracing::warn!(error = %err, application_id = id, "Status change notification failed");
        }

        Ok(Some(application))
    }

    pub async fn list_for_job_offer(
        &self,
        caller: &Caller,
        job_offer_id: i64,
    ) -> Result<Option<Vec<JobApplication>>> {
        match self.offers.find(job_offer_id).await? {
            Some(offer) if caller.can_manage_offer_of(offer.user_id) => {
                Ok(Some(self.applications.list_by_job_offer(job_offer_id).await?))
            }
            _ => {
                tracing::debug!(job_offer_id, ?caller, "Application listing denied");
                Ok(None)
            }
        }
    }

    pub async fn list_mine(&self, caller: &Caller) -> Result<Option<Vec<JobApplication>>> {
        match *caller {
            Caller::Candidate(id) => Ok(Some(self.applications.list_by_candidate(id).await?)),
            _ => Ok(None),
        }
    }

    /// Newest applications; recruiters only see those to their own offers.
    pub async fn list_recent(
        &self,
        caller: &Caller,
        limit: i64,
    ) -> Result<Option<Vec<ApplicationDetail>>> {
        let owner = match *caller {
            Caller::Admin(_) => None,
            Caller::Recruiter(id) => Some(id),
            Caller::Candidate(_) => return Ok(None),
        };
        let applications = self.applications.list_recent(limit, owner).await?;
        Ok(Some(self.with_details(applications).await?))
    }

    /// Admin, the applying candidate, or the recruiter owning the offer.
    pub async fn find_for_caller(
        &self,
        caller: &Caller,
        id: i64,
    ) -> Result<Option<ApplicationDetail>> {
        let Some(application) = self.applications.find(id).await? else {
            return Ok(None);
        };
        let offer = self.offers.find(application.job_offer_id).await?;

        let allowed = match *caller {
            Caller::Admin(_) => true,
            Caller::Candidate(id) => application.user_id == id,
            Caller::Recruiter(id) => offer.as_ref().map_or(false, |o| o.is_owned_by(id)),
        };
        if !allowed {
            tracing::debug!(application_id = id, ?caller, "Application lookup denied");
            return Ok(None);
        }

        let candidate = self
            .users
            .find(application.user_id)
            .await?
            .as_ref()
            .map(UserSummary::from);
        Ok(Some(ApplicationDetail {
            application,
            job_offer: offer,
            candidate,
        }))
    }

    /// Same visibility as `find_for_caller`.
    pub async fn resume_for_caller(&self, caller: &Caller, id: i64) -> Result<ResumeLookup> {
        let Some(detail) = self.find_for_caller(caller, id).await? else {
            return Ok(ResumeLookup::Denied);
        };
        let Some(path) = detail.application.cv_path else {
            return Ok(ResumeLookup::NotAttached);
        };
        match self.storage.read(&path).await? {
            Some(data) => Ok(ResumeLookup::Available { path, data }),
            None => {
                tracing::warn!(application_id = id, path = %path, "Stored résumé is missing");
                Ok(ResumeLookup::NotAttached)
            }
        }
    }

    pub async fn statistics(
        &self,
        caller: &Caller,
        scope: StatisticsScope,
    ) -> Result<Option<ApplicationStatistics>> {
        if !scope.permits(caller) {
            tracing::debug!(?scope, ?caller, "Statistics denied");
            return Ok(None);
        }

        let today = today();
        let statistics = match scope {
            StatisticsScope::Global => {
                let applications = self.applications.list_all().await?;
                let offers = self.offers.list_all().await?;
                let status_counts = StatusCounts::tally(&applications);
                ApplicationStatistics::Global(GlobalApplicationStatistics {
                    total_applications: status_counts.total(),
                    total_offers: offers.len() as i64,
                    active_offers: offers.iter().filter(|o| o.is_open_on(today)).count() as i64,
                    status_counts,
                    total_candidates: self.users.count_by_role(Role::Candidate).await?,
                    total_recruiters: self.users.count_by_role(Role::Recruiter).await?,
                })
            }
            StatisticsScope::Recruiter(recruiter_id) => {
                let offers = self.offers.list_by_owner(recruiter_id).await?;
                let offer_ids: Vec<i64> = offers.iter().map(|o| o.id).collect();
                let applications = self.applications.list_by_job_offers(&offer_ids).await?;
                let status_counts = StatusCounts::tally(&applications);

                let mut offer_application_counts: BTreeMap<i64, OfferApplicationCount> = offers
                    .iter()
                    .map(|offer| {
                        (
                            offer.id,
                            OfferApplicationCount {
                                title: offer.title.clone(),
                                count: 0,
                            },
                        )
                    })
                    .collect();
                for application in &applications {
                    if let Some(entry) = offer_application_counts.get_mut(&application.job_offer_id) {
                        entry.count += 1;
                    }
                }

                ApplicationStatistics::Recruiter(RecruiterApplicationStatistics {
                    total_applications: status_counts.total(),
                    total_offers: offers.len() as i64,
                    active_offers: offers.iter().filter(|o| o.is_open_on(today)).count() as i64,
                    status_counts,
                    offer_application_counts,
                })
            }
            StatisticsScope::Candidate(candidate_id) => {
                let applications = self.applications.list_by_candidate(candidate_id).await?;
                let status_counts = StatusCounts::tally(&applications);
                ApplicationStatistics::Candidate(CandidateApplicationStatistics {
                    total_applications: status_counts.total(),
                    status_counts,
                })
            }
        };
        Ok(Some(statistics))
    }

    async fn can_review(&self, caller: &Caller, id: i64) -> Result<bool> {
        let Some(application) = self.applications.find(id).await? else {
            return Ok(false);
        };
        Ok(self
            .offers
            .find(application.job_offer_id)
            .await?
            .map_or(false, |offer| caller.can_manage_offer_of(offer.user_id)))
    }

    async fn with_details(&self, applications: Vec<JobApplication>) -> Result<Vec<ApplicationDetail>> {
        let mut offers: HashMap<i64, Option<JobOffer>> = HashMap::new();
        let mut candidates: HashMap<i64, Option<UserSummary>> = HashMap::new();
        let mut details = Vec::with_capacity(applications.len());

        for application in applications {
            if !offers.contains_key(&application.job_offer_id) {
                let offer = self.offers.find(application.job_offer_id).await?;
                offers.insert(application.job_offer_id, offer);
            }
            if !candidates.contains_key(&application.user_id) {
                let candidate = self
                    .users
                    .find(application.user_id)
                    .await?
                    .as_ref()
                    .map(UserSummary::from);
                candidates.insert(application.user_id, candidate);
            }
            details.push(ApplicationDetail {
                job_offer: offers.get(&application.job_offer_id).cloned().flatten(),
                candidate: candidates.get(&application.user_id).cloned().flatten(),
                application,
            });
        }
        Ok(details)
    }
}
