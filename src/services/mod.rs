pub mod auth_service;
pub mod job_application_service;
pub mod job_offer_service;
pub mod notification_service;
pub mod resume_storage;
