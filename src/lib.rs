pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::repositories::Repositories;
use crate::services::{
    auth_service::AuthService, job_application_service::JobApplicationService,
    job_offer_service::JobOfferService, notification_service::notifier_for,
    resume_storage::LocalResumeStorage,
};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub job_offer_service: JobOfferService,
    pub job_application_service: JobApplicationService,
}

impl AppState {
    pub fn new(config: &Config, repositories: Repositories) -> Self {
        let storage = Arc::new(LocalResumeStorage::new(config.uploads_dir.clone()));
        let notifier = notifier_for(config.status_notifier);

        let auth_service = AuthService::new(
            repositories.users.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_minutes,
            config.password_reset_ttl_minutes,
        );
        let job_offer_service = JobOfferService::new(repositories.job_offers.clone());
        let job_application_service =
            JobApplicationService::new(&repositories, storage, notifier);

        Self {
            auth_service,
            job_offer_service,
            job_application_service,
        }
    }
}
