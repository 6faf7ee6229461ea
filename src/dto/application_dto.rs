use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::error::Result;
use crate::models::job_application::{ApplicationDetail, ApplicationStatus, JobApplication};
use crate::utils::validation::{error_with_message, validate_with};

pub const MAX_NOTES_CHARS: usize = 1000;
pub const MAX_RESUME_BYTES: usize = 2 * 1024 * 1024;
pub const RESUME_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const RESUME_MIME_TYPES: [&str; 4] = [
    "application/pdf",
    "application/msword",
    DOCX_MIME,
    "application/octet-stream",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ApplyPayload {
    #[validate(length(max = 5000))]
    pub cover_letter: Option<String>,
}

/// Résumé file received with an application.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl ResumeUpload {
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    fn check_into(&self, errors: &mut ValidationErrors) {
        let extension = self.extension();
        let known_extension = extension
            .as_deref()
            .map_or(false, |ext| RESUME_EXTENSIONS.contains(&ext));
        let known_mime = self.content_type.as_deref().map_or(true, |mime| {
            let mime = mime.split(';').next().unwrap_or(mime).trim();
            RESUME_MIME_TYPES.contains(&mime)
        });

        if !known_extension || !known_mime {
            errors.add(
                "cv",
                error_with_message("mimes", "The cv must be a file of type: pdf, doc, docx."),
            );
            return;
        }
        if self.data.is_empty() {
            errors.add("cv", error_with_message("file", "The cv must be a file."));
            return;
        }
        if self.data.len() > MAX_RESUME_BYTES {
            errors.add(
                "cv",
                error_with_message("max", "The cv must not be greater than 2048 kilobytes."),
            );
            return;
        }
        if extension.as_deref() == Some("pdf") && !self.data.starts_with(b"%PDF") {
            errors.add(
                "cv",
                error_with_message("mimes", "The cv content is not a valid PDF document."),
            );
        }
    }
}

/// Body of `POST /applications/job/{id}`, JSON or multipart.
#[derive(Debug, Clone, Default)]
pub struct ApplicationForm {
    pub payload: ApplyPayload,
    pub resume: Option<ResumeUpload>,
}

impl ApplicationForm {
    pub fn check(&self) -> Result<()> {
        validate_with(&self.payload, |errors| {
            if let Some(resume) = &self.resume {
                resume.check_into(errors);
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateStatusPayload {
    #[validate(custom(function = "crate::utils::validation::application_status"))]
    pub status: String,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl UpdateStatusPayload {
    /// Validated status; only call after `validate`.
    pub fn parsed_status(&self) -> Option<ApplicationStatus> {
        self.status.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RecentApplicationsQuery {
    pub limit: Option<i64>,
}

impl RecentApplicationsQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(5).clamp(1, 50)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationListResponse {
    pub applications: Vec<JobApplication>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDetailListResponse {
    pub applications: Vec<ApplicationDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub application: ApplicationDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationCreatedResponse {
    pub message: String,
    pub application: JobApplication,
}

/// Content type to serve a stored résumé with, from its extension.
pub fn resume_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => DOCX_MIME,
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsResponse<T: Serialize> {
    pub statistics: T,
}
