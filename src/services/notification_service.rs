//! Status-change notification port.
//!
//! The application service calls the notifier synchronously once a status
//! update has been committed. Delivery (mail, queue, webhook) is left to
//! implementations; failures are logged by the caller and never roll back the
//! status change.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::NotifierKind;
use crate::models::job_application::ApplicationStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusChange {
    pub application_id: i64,
    pub job_offer_id: i64,
    pub candidate_id: i64,
    pub previous: ApplicationStatus,
    pub current: ApplicationStatus,
    pub changed_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusChangeNotifier: Send + Sync {
    async fn status_changed(&self, change: StatusChange) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl StatusChangeNotifier for NoopNotifier {
    async fn status_changed(&self, _change: StatusChange) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Writes every change to the log; useful until a real channel exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl StatusChangeNotifier for TracingNotifier {
    async fn status_changed(&self, change: StatusChange) -> anyhow::Result<()> {
        tracing::info!(
            application_id = change.application_id,
            job_offer_id = change.job_offer_id,
            candidate_id = change.candidate_id,
            previous = %change.previous,
            current = %change.current,
            "Application status changed"
        );
        Ok(())
    }
}

pub fn notifier_for(kind: NotifierKind) -> std::sync::Arc<dyn StatusChangeNotifier> {
    match kind {
        NotifierKind::Noop => std::sync::Arc::new(NoopNotifier),
        NotifierKind::Log => std::sync::Arc::new(TracingNotifier),
    }
}
