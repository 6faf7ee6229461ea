//! Per-endpoint failure policy.
//!
//! Services answer refusals with sentinels. This table decides how each
//! endpoint reports a refusal and a missing resource. Most endpoints collapse
//! the two into the same 403 so that ids cannot be enumerated; showing a single
//! job offer is the one place where a missing offer is a real 404.

use crate::error::{Error, Result};
use crate::models::caller::Caller;

pub const APPLY_REFUSED: &str =
    "Unable to apply for this job. You may have already applied or the job offer is not active.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ShowJobOffer,
    CreateJobOffer,
    UpdateJobOffer,
    DeleteJobOffer,
    JobOfferStatistics,
    Apply,
    Withdraw,
    ListForJobOffer,
    UpdateStatus,
    ShowApplication,
    MyApplications,
    RecentApplications,
    ApplicationStatistics,
}

impl Endpoint {
    /// Response for a caller the service refused.
    pub fn denied(self) -> Error {
        match self {
            Endpoint::CreateJobOffer => Error::Forbidden("Unauthorized to create job offers".into()),
            Endpoint::UpdateJobOffer | Endpoint::DeleteJobOffer | Endpoint::ListForJobOffer => {
                Error::Forbidden("Unauthorized or job offer not found".into())
            }
            Endpoint::Withdraw | Endpoint::UpdateStatus | Endpoint::ShowApplication => {
                Error::Forbidden("Unauthorized or application not found".into())
            }
            Endpoint::Apply => Error::BadRequest(APPLY_REFUSED.into()),
            Endpoint::ShowJobOffer
            | Endpoint::JobOfferStatistics
            | Endpoint::MyApplications
            | Endpoint::RecentApplications
            | Endpoint::ApplicationStatistics => Error::Forbidden("Unauthorized access".into()),
        }
    }

    /// Response when the addressed resource does not exist.
    pub fn missing(self) -> Error {
        match self {
            Endpoint::ShowJobOffer => Error::NotFound("Job offer not found".into()),
            other => other.denied(),
        }
    }

    /// Role check run before the payload is validated or the service called.
    /// Always agrees with the service; only saves the work.
    pub fn precheck(self, caller: &Caller) -> Result<()> {
        let allowed = match self {
            Endpoint::CreateJobOffer => matches!(caller, Caller::Recruiter(_)),
            Endpoint::Apply | Endpoint::MyApplications => matches!(caller, Caller::Candidate(_)),
            Endpoint::JobOfferStatistics | Endpoint::RecentApplications => {
                matches!(caller, Caller::Recruiter(_) | Caller::Admin(_))
            }
            _ => true,
        };
        if allowed {
            Ok(())
        } else {
            tracing::debug!(endpoint = ?self, ?caller, "Role pre-check failed");
            Err(Error::Forbidden(match self {
                Endpoint::CreateJobOffer => "Unauthorized to create job offers".into(),
                _ => "Unauthorized access".into(),
            }))
        }
    }
}
