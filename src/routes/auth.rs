use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::{
        auth_dto::{
            AuthResponse, ForgotPasswordPayload, LoginPayload, RegisterPayload,
            ResetPasswordPayload, UserResponse,
        },
        MessageResponse,
    },
    error::Result,
    models::{caller::Caller, user::User},
    routes::extract::JsonPayload,
    AppState,
};

const RESET_LINK_SENT: &str =
    "If an account exists for this e-mail, a password reset link has been sent.";

fn token_envelope(state: &AppState, user: User, message: Option<&str>) -> Result<AuthResponse> {
    let issued = state.auth_service.issue_token(&user)?;
    Ok(AuthResponse {
        message: message.map(str::to_string),
        user,
        token: issued.token,
        token_type: "bearer".into(),
        expires_in: issued.expires_in,
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "User registered", body = Json<AuthResponse>),
        (status = 422, description = "Invalid payload or e-mail already taken")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.auth_service.register(payload).await?;
    let body = token_envelope(&state, user, Some("User successfully registered"))?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Logged in", body = Json<AuthResponse>),
        (status = 401, description = "Invalid credentials")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.auth_service.login(payload).await?;
    Ok(Json(token_envelope(&state, user, None)?))
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordPayload,
    responses(
        (status = 200, description = "Same answer whether or not the account exists", body = Json<MessageResponse>)
    )
)]
#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<ForgotPasswordPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if let Some(token) = state
        .auth_service
        .request_password_reset(&payload.email)
        .await?
    {
        // no mailer yet; the token goes to the delivery log
        tracing::debug!(email = %payload.email, reset_token = %token, "Password reset link ready for delivery");
    }
    Ok(Json(MessageResponse::new(RESET_LINK_SENT)))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Password has been reset", body = Json<MessageResponse>),
        (status = 400, description = "Invalid or expired token")
    )
)]
#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<ResetPasswordPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.auth_service.reset_password(payload).await?;
    Ok(Json(MessageResponse::new("Password has been reset successfully")))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = Json<MessageResponse>)
    )
)]
#[axum::debug_handler]
pub async fn logout(caller: Caller) -> Result<impl IntoResponse> {
    tracing::info!(user_id = caller.user_id(), "User logged out");
    Ok(Json(MessageResponse::new("Successfully logged out")))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Fresh token for the current user", body = Json<AuthResponse>),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn refresh(State(state): State<AppState>, caller: Caller) -> Result<impl IntoResponse> {
    let user = state.auth_service.current_user(&caller).await?;
    Ok(Json(token_envelope(&state, user, None)?))
}

#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "Current user", body = Json<UserResponse>),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn current_user(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.current_user(&caller).await?;
    Ok(Json(UserResponse { user }))
}
