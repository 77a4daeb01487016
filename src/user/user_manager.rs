use super::auth::{hash_password, verify_password, TokenIssuer, TokenKind};
use super::user_models::{
    LoginRequest, LoginResponse, RefreshResponse, Registration, UserId, UserView,
};
use super::user_store::UserStore;
use crate::errors::{ServiceError, ServiceResult};
use std::sync::Arc;
use tracing::{debug, info};

pub const TOKEN_TYPE: &str = "bearer";

const MIN_USERNAME_CHARS: usize = 3;
const MAX_USERNAME_CHARS: usize = 50;
const MIN_PASSWORD_CHARS: usize = 6;
const MAX_PASSWORD_BYTES: usize = 72;

fn validate_registration(registration: &Registration) -> ServiceResult<()> {
    let valid_email = registration
        .email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid_email {
        return Err(ServiceError::validation("Invalid email address"));
    }

    let username_chars = registration.username.chars().count();
    if !(MIN_USERNAME_CHARS..=MAX_USERNAME_CHARS).contains(&username_chars) {
        return Err(ServiceError::validation(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_CHARS, MAX_USERNAME_CHARS
        )));
    }

    if registration.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ServiceError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    if registration.password.len() > MAX_PASSWORD_BYTES {
        return Err(ServiceError::validation(format!(
            "Password cannot be longer than {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}

pub struct UserManager {
    user_store: Arc<dyn UserStore>,
    tokens: TokenIssuer,
}

impl UserManager {
    pub fn new(user_store: Arc<dyn UserStore>, tokens: TokenIssuer) -> Self {
        Self { user_store, tokens }
    }

    pub fn register(&self, registration: &Registration) -> ServiceResult<UserView> {
        validate_registration(registration)?;

        if self
            .user_store
            .find_by_email_or_username(&registration.email, &registration.username)?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "Email or username already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&registration.password)?;
        let user_id = self.user_store.create_user(
            &registration.email,
            &registration.username,
            &password_hash,
        )?;
        info!("Registered user {} ({})", user_id, registration.username);
        self.me(user_id)
    }

    pub fn login(&self, request: &LoginRequest) -> ServiceResult<LoginResponse> {
        let invalid = || ServiceError::Unauthorized("Incorrect email or password".to_string());

        let user = self
            .user_store
            .get_user_by_email(&request.email)?
            .ok_or_else(invalid)?;
        if !verify_password(&request.password, &user.password_hash)? {
            debug!("Wrong password for user {}", user.id);
            return Err(invalid());
        }

        Ok(LoginResponse {
            access_token: self.tokens.issue(user.id, TokenKind::Access)?,
            refresh_token: self.tokens.issue(user.id, TokenKind::Refresh)?,
            token_type: TOKEN_TYPE.to_string(),
            user: user.into(),
        })
    }

    pub fn refresh(&self, refresh_token: &str) -> ServiceResult<RefreshResponse> {
        let user_id = self
            .tokens
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|err| {
                debug!("Rejected refresh token: {}", err);
                ServiceError::Unauthorized("Invalid refresh token".to_string())
            })?;
        if self.user_store.get_user(user_id)?.is_none() {
            return Err(ServiceError::Unauthorized("User not found".to_string()));
        }

        Ok(RefreshResponse {
            access_token: self.tokens.issue(user_id, TokenKind::Access)?,
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    pub fn me(&self, user_id: UserId) -> ServiceResult<UserView> {
        self.user_store
            .get_user(user_id)?
            .map(UserView::from)
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    /// Resolves an access token to a user id, None if it is not usable.
    pub fn authenticate(&self, access_token: &str) -> Option<UserId> {
        match self.tokens.verify(access_token, TokenKind::Access) {
            Ok(user_id) => Some(user_id),
            Err(err) => {
                debug!("Rejected access token: {}", err);
                None
            }
        }
    }
}
