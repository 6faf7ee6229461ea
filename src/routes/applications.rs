use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::{
        application_dto::{
            ApplicationCreatedResponse, ApplicationDetailListResponse, ApplicationForm,
            ApplicationListResponse, ApplicationResponse, ApplyPayload, RecentApplicationsQuery,
            resume_content_type, ResumeUpload, StatisticsResponse, UpdateStatusPayload,
        },
        MessageResponse,
    },
    error::{Error, Result},
    models::caller::Caller,
    routes::{
        extract::{data_error_fields, JsonPayload},
        policy::Endpoint,
    },
    services::job_application_service::{ResumeLookup, StatisticsScope},
    utils::validation::field_error,
    AppState,
};

/// Accepts `multipart/form-data` (with an optional `cv` file), a JSON body,
/// or no body at all.
#[async_trait]
impl<S> FromRequest<S> for ApplicationForm
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or(false, |value| {
                value.to_ascii_lowercase().starts_with("multipart/form-data")
            });

        if !is_multipart {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|rejection| Error::BadRequest(rejection.body_text()))?;
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(ApplicationForm::default());
            }
            let payload: ApplyPayload = serde_json::from_slice(&body).map_err(|err| {
                if err.is_data() {
                    Error::InvalidFields(data_error_fields(&err.to_string()))
                } else {
                    Error::Json(err)
                }
            })?;
            return Ok(ApplicationForm {
                payload,
                resume: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| Error::BadRequest(rejection.body_text()))?;
        let mut form = ApplicationForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "cover_letter" => {
                    let text = field.text().await?;
                    if !text.is_empty() {
                        form.payload.cover_letter = Some(text);
                    }
                }
                "cv" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await?;
                    // browsers send an empty part when no file was picked
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    form.resume = Some(ResumeUpload {
                        file_name,
                        content_type,
                        data,
                    });
                }
                _ => {}
            }
        }
        Ok(form)
    }
}

#[utoipa::path(
    get,
    path = "/api/applications/my",
    responses(
        (status = 200, description = "The candidate's own applications", body = Json<ApplicationListResponse>),
        (status = 403, description = "Unauthorized access")
    )
)]
#[axum::debug_handler]
pub async fn my_applications(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse> {
    Endpoint::MyApplications.precheck(&caller)?;
    let applications = state
        .job_application_service
        .list_mine(&caller)
        .await?
        .ok_or_else(|| Endpoint::MyApplications.denied())?;
    Ok(Json(ApplicationListResponse { applications }))
}

#[utoipa::path(
    post,
    path = "/api/applications/job/{job_offer_id}",
    params(
        ("job_offer_id" = i64, Path, description = "Job offer ID")
    ),
    request_body(content = ApplyPayload, description = "JSON, or multipart with cover_letter and an optional cv file"),
    responses(
        (status = 201, description = "Application submitted successfully", body = Json<ApplicationCreatedResponse>),
        (status = 400, description = "Offer closed or missing, or already applied"),
        (status = 403, description = "Caller is not a candidate"),
        (status = 422, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    caller: Caller,
    Path(job_offer_id): Path<i64>,
    form: ApplicationForm,
) -> Result<impl IntoResponse> {
    Endpoint::Apply.precheck(&caller)?;
    form.check()?;
    let application = state
        .job_application_service
        .apply(&caller, job_offer_id, form.payload, form.resume)
        .await?
        .ok_or_else(|| Endpoint::Apply.denied())?;
    Ok((
        StatusCode::CREATED,
        Json(ApplicationCreatedResponse {
            message: "Application submitted successfully".into(),
            application,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/applications/{id}",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application withdrawn successfully", body = Json<MessageResponse>),
        (status = 403, description = "Unauthorized or application not found")
    )
)]
#[axum::debug_handler]
pub async fn withdraw(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    if !state.job_application_service.withdraw(&caller, id).await? {
        return Err(Endpoint::Withdraw.denied());
    }
    Ok(Json(MessageResponse::new("Application withdrawn successfully")))
}

#[utoipa::path(
    get,
    path = "/api/applications/job/{job_offer_id}",
    params(
        ("job_offer_id" = i64, Path, description = "Job offer ID")
    ),
    responses(
        (status = 200, description = "Applications to the offer", body = Json<ApplicationListResponse>),
        (status = 403, description = "Unauthorized or job offer not found")
    )
)]
#[axum::debug_handler]
pub async fn job_offer_applications(
    State(state): State<AppState>,
    caller: Caller,
    Path(job_offer_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let applications = state
        .job_application_service
        .list_for_job_offer(&caller, job_offer_id)
        .await?
        .ok_or_else(|| Endpoint::ListForJobOffer.denied())?;
    Ok(Json(ApplicationListResponse { applications }))
}

#[utoipa::path(
    put,
    path = "/api/applications/{id}/status",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Application status updated successfully", body = Json<MessageResponse>),
        (status = 403, description = "Unauthorized or application not found"),
        (status = 422, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    JsonPayload(payload): JsonPayload<UpdateStatusPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let status = payload
        .parsed_status()
        .ok_or_else(|| field_error("status", "in", "The selected status is invalid."))?;
    state
        .job_application_service
        .update_status(&caller, id, status, payload.notes)
        .await?
        .ok_or_else(|| Endpoint::UpdateStatus.denied())?;
    Ok(Json(MessageResponse::new(
        "Application status updated successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/applications/statistics",
    responses(
        (status = 200, description = "Counts scoped to the caller's role"),
        (status = 403, description = "Unauthorized access")
    )
)]
#[axum::debug_handler]
pub async fn application_statistics(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse> {
    let statistics = state
        .job_application_service
        .statistics(&caller, StatisticsScope::for_caller(&caller))
        .await?
        .ok_or_else(|| Endpoint::ApplicationStatistics.denied())?;
    Ok(Json(StatisticsResponse { statistics }))
}

#[utoipa::path(
    get,
    path = "/api/applications/recent",
    params(
        ("limit" = Option<i64>, Query, description = "Number of applications, 1 to 50, default 5")
    ),
    responses(
        (status = 200, description = "Newest applications with offer and candidate", body = Json<ApplicationDetailListResponse>),
        (status = 403, description = "Unauthorized access")
    )
)]
#[axum::debug_handler]
pub async fn recent_applications(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<RecentApplicationsQuery>,
) -> Result<impl IntoResponse> {
    Endpoint::RecentApplications.precheck(&caller)?;
    let applications = state
        .job_application_service
        .list_recent(&caller, query.effective_limit())
        .await?
        .ok_or_else(|| Endpoint::RecentApplications.denied())?;
    Ok(Json(ApplicationDetailListResponse { applications }))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application with offer and candidate", body = Json<ApplicationResponse>),
        (status = 403, description = "Unauthorized or application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let application = state
        .job_application_service
        .find_for_caller(&caller, id)
        .await?
        .ok_or_else(|| Endpoint::ShowApplication.denied())?;
    Ok(Json(ApplicationResponse { application }))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}/cv",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "The stored résumé file"),
        (status = 403, description = "Unauthorized or application not found"),
        (status = 404, description = "No résumé attached")
    )
)]
#[axum::debug_handler]
pub async fn download_resume(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    match state.job_application_service.resume_for_caller(&caller, id).await? {
        ResumeLookup::Available { path, data } => {
            let file_name = path.rsplit('/').next().unwrap_or("cv").to_string();
            Ok((
                [
                    (CONTENT_TYPE, resume_content_type(&path).to_string()),
                    (
                        CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", file_name),
                    ),
                ],
                data,
            ))
        }
        ResumeLookup::NotAttached => Err(Error::NotFound(
            "No résumé is attached to this application".into(),
        )),
        ResumeLookup::Denied => Err(Endpoint::ShowApplication.denied()),
    }
}
