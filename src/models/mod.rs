pub mod caller;
pub mod job_application;
pub mod job_offer;
pub mod user;
