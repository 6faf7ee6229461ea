use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    dto::{
        application_dto::StatisticsResponse,
        job_offer_dto::{
            CreateJobOfferPayload, JobOfferListResponse, JobOfferMutationResponse,
            JobOfferResponse, JobOfferStatisticsQuery, UpdateJobOfferPayload,
        },
        MessageResponse,
    },
    error::Result,
    models::caller::Caller,
    routes::{extract::JsonPayload, policy::Endpoint},
    services::job_offer_service::OfferLookup,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/job-offers",
    responses(
        (status = 200, description = "Offers owned by a recruiter, open offers for everyone else", body = Json<JobOfferListResponse>),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn list_job_offers(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse> {
    let job_offers = state.job_offer_service.list_for_caller(&caller).await?;
    Ok(Json(JobOfferListResponse { job_offers }))
}

#[utoipa::path(
    post,
    path = "/api/job-offers",
    request_body = CreateJobOfferPayload,
    responses(
        (status = 201, description = "Job offer created successfully", body = Json<JobOfferMutationResponse>),
        (status = 403, description = "Caller is not a recruiter"),
        (status = 422, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_job_offer(
    State(state): State<AppState>,
    caller: Caller,
    JsonPayload(payload): JsonPayload<CreateJobOfferPayload>,
) -> Result<impl IntoResponse> {
    Endpoint::CreateJobOffer.precheck(&caller)?;
    payload.check()?;
    let job_offer = state
        .job_offer_service
        .create(&caller, payload)
        .await?
        .ok_or_else(|| Endpoint::CreateJobOffer.denied())?;
    Ok((
        StatusCode::CREATED,
        Json(JobOfferMutationResponse {
            message: "Job offer created successfully".into(),
            job_offer: Some(job_offer),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/job-offers/{id}",
    params(
        ("id" = i64, Path, description = "Job offer ID")
    ),
    responses(
        (status = 200, description = "Job offer found", body = Json<JobOfferResponse>),
        (status = 403, description = "Offer is closed and caller is neither owner nor admin"),
        (status = 404, description = "Job offer not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job_offer(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    match state.job_offer_service.find_for_caller(&caller, id).await? {
        OfferLookup::Visible(job_offer) => Ok(Json(JobOfferResponse { job_offer })),
        OfferLookup::Hidden => Err(Endpoint::ShowJobOffer.denied()),
        OfferLookup::Missing => Err(Endpoint::ShowJobOffer.missing()),
    }
}

#[utoipa::path(
    put,
    path = "/api/job-offers/{id}",
    params(
        ("id" = i64, Path, description = "Job offer ID")
    ),
    request_body = UpdateJobOfferPayload,
    responses(
        (status = 200, description = "Job offer updated successfully", body = Json<JobOfferMutationResponse>),
        (status = 403, description = "Unauthorized or job offer not found"),
        (status = 422, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn update_job_offer(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    JsonPayload(payload): JsonPayload<UpdateJobOfferPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    let job_offer = state
        .job_offer_service
        .update(&caller, id, payload)
        .await?
        .ok_or_else(|| Endpoint::UpdateJobOffer.denied())?;
    Ok(Json(JobOfferMutationResponse {
        message: "Job offer updated successfully".into(),
        job_offer: Some(job_offer),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/job-offers/{id}",
    params(
        ("id" = i64, Path, description = "Job offer ID")
    ),
    responses(
        (status = 200, description = "Job offer deleted successfully", body = Json<MessageResponse>),
        (status = 403, description = "Unauthorized or job offer not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_job_offer(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    if !state.job_offer_service.delete(&caller, id).await? {
        return Err(Endpoint::DeleteJobOffer.denied());
    }
    Ok(Json(MessageResponse::new("Job offer deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/job-offers/statistics",
    params(
        ("recruiter_id" = Option<i64>, Query, description = "Recruiter to report on; defaults to the caller")
    ),
    responses(
        (status = 200, description = "Offer counts: total_offers, active_offers, expired_offers"),
        (status = 403, description = "Unauthorized access")
    )
)]
#[axum::debug_handler]
pub async fn job_offer_statistics(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<JobOfferStatisticsQuery>,
) -> Result<impl IntoResponse> {
    Endpoint::JobOfferStatistics.precheck(&caller)?;
    let statistics = state
        .job_offer_service
        .statistics(&caller, query.recruiter_id)
        .await?
        .ok_or_else(|| Endpoint::JobOfferStatistics.denied())?;
    Ok(Json(StatisticsResponse { statistics }))
}
