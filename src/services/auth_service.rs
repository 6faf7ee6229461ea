use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::dto::auth_dto::{LoginPayload, RegisterPayload, ResetPasswordPayload};
use crate::error::{Error, Result};
use crate::models::caller::Caller;
use crate::models::user::{NewUser, Role, User};
use crate::repositories::UserRepository;
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::time::{minutes_from_now, now};
use crate::utils::token::{generate_access_token, hash_token, token_matches};
use crate::utils::validation::field_error;

const RESET_TOKEN_LENGTH: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl Claims {
    pub fn caller(&self) -> Result<Caller> {
        let user_id = self
            .sub
            .parse::<i64>()
            .map_err(|_| Error::Unauthorized("invalid_token".into()))?;
        Ok(Caller::new(user_id, self.role))
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_secret: String,
    jwt_ttl_minutes: i64,
    reset_ttl_minutes: i64,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        jwt_secret: String,
        jwt_ttl_minutes: i64,
        reset_ttl_minutes: i64,
    ) -> Self {
        Self {
            users,
            jwt_secret,
            jwt_ttl_minutes,
            reset_ttl_minutes,
        }
    }

    pub async fn register(&self, payload: RegisterPayload) -> Result<User> {
        let role: Role = payload
            .role
            .parse()
            .map_err(|_| field_error("role", "in", "The role must be either candidate or recruiter."))?;
        if role == Role::Admin {
            return Err(field_error(
                "role",
                "in",
                "The role must be either candidate or recruiter.",
            ));
        }

        let new_user = NewUser {
            name: payload.name.trim().to_string(),
            email: normalize_email(&payload.email),
            password_hash: hash_password(&payload.password)?,
            role,
        };

        match self.users.create(new_user).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, role = %user.role, "User registered");
                Ok(user)
            }
            Err(Error::Conflict(_)) => Err(field_error(
                "email",
                "unique",
                "The email has already been taken.",
            )),
            Err(err) => Err(err),
        }
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<User> {
        let email = normalize_email(&payload.email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::debug!("Login with unknown e-mail");
            return Err(Error::Unauthorized("Invalid credentials".into()));
        };
        if !verify_password(&payload.password, &user.password_hash)? {
            tracing::debug!(user_id = user.id, "Login with wrong password");
            return Err(Error::Unauthorized("Invalid credentials".into()));
        }
        tracing::info!(user_id = user.id, "User logged in");
        Ok(user)
    }

    pub fn issue_token(&self, user: &User) -> Result<IssuedToken> {
        let issued_at = now();
        let expires_at = issued_at + Duration::minutes(self.jwt_ttl_minutes);
        let claims = Claims {
            sub: user.id.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: issued_at.timestamp() as usize,
            role: user.role,
            name: user.name.clone(),
            email: user.email.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok(IssuedToken {
            token,
            expires_in: self.jwt_ttl_minutes * 60,
        })
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }

    pub async fn current_user(&self, caller: &Caller) -> Result<User> {
        self.users
            .find(caller.user_id())
            .await?
            .ok_or_else(|| Error::Unauthorized("invalid_token".into()))
    }

    /// Creates a reset token when the account exists. The caller answers the
    /// same way either way; the raw token is returned for delivery.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>> {
        let email = normalize_email(email);
        if self.users.find_by_email(&email).await?.is_none() {
            tracing::debug!("Password reset requested for unknown e-mail");
            return Ok(None);
        }

        let token = generate_access_token(RESET_TOKEN_LENGTH);
        self.users
            .store_reset_token(&email, &hash_token(&token), minutes_from_now(self.reset_ttl_minutes))
            .await?;
        tracing::info!(email = %email, "Password reset token issued");
        Ok(Some(token))
    }

    pub async fn reset_password(&self, payload: ResetPasswordPayload) -> Result<()> {
        let email = normalize_email(&payload.email);
        let invalid = || Error::BadRequest("This password reset token is invalid.".into());

        let stored = self
            .users
            .find_reset_token(&email)
            .await?
            .ok_or_else(invalid)?;
        if stored.expires_at < now() {
            self.users.delete_reset_token(&email).await?;
            return Err(invalid());
        }
        if !token_matches(&payload.token, &stored.token_hash) {
            return Err(invalid());
        }
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid)?;

        self.users
            .update_password(user.id, &hash_password(&payload.password)?)
            .await?;
        self.users.delete_reset_token(&email).await?;
        tracing::info!(user_id = user.id, "Password reset");
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
