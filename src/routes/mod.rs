pub mod applications;
pub mod auth;
pub mod extract;
pub mod health;
pub mod job_offers;
pub mod policy;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::{
    middleware::{auth::require_bearer_auth, cors::permissive_cors},
    AppState,
};

/// Résumé uploads are capped at 2 MiB; this leaves room for the multipart
/// framing and the cover letter.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

pub fn app_router(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password));

    let protected_api = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/refresh", post(auth::refresh))
        .route("/user", get(auth::current_user))
        .route(
            "/job-offers",
            get(job_offers::list_job_offers).post(job_offers::create_job_offer),
        )
        .route("/job-offers/statistics", get(job_offers::job_offer_statistics))
        .route(
            "/job-offers/:id",
            get(job_offers::get_job_offer)
                .put(job_offers::update_job_offer)
                .delete(job_offers::delete_job_offer),
        )
        .route("/applications/my", get(applications::my_applications))
        .route(
            "/applications/statistics",
            get(applications::application_statistics),
        )
        .route("/applications/recent", get(applications::recent_applications))
        .route(
            "/applications/job/:job_offer_id",
            get(applications::job_offer_applications).post(applications::apply),
        )
        .route("/applications/:id/status", put(applications::update_status))
        .route("/applications/:id/cv", get(applications::download_resume))
        .route(
            "/applications/:id",
            get(applications::get_application).delete(applications::withdraw),
        )
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", public_api.merge(protected_api))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(permissive_cors())
        .with_state(state)
}
