use axum::{
    async_trait,
    extract::{
        rejection::FormRejection, FromRef, FromRequest, FromRequestParts, Multipart, Request,
    },
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        request::Parts,
    },
    Form,
};
use axum_extra::extract::CookieJar;
use tracing::warn;

use crate::{
    auth::{dto::LoginRequest, jwt::JwtKeys, repo::User},
    error::ApiError,
    extract::JsonBody,
    state::AppState,
};

/// The authenticated, active caller.
///
/// The access token is read from `Authorization: Bearer <token>` or, failing
/// that, from the auth cookie.
pub struct CurrentUser(pub User);

/// An authenticated, active superuser; other callers get 403.
pub struct CurrentSuperuser(pub User);

fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::to_owned)
}

fn cookie_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(cookie_name)
        .map(|c| c.value().to_owned())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts, &state.config.cookie.name))
            .ok_or(ApiError::Unauthorized)?;

        let claims = JwtKeys::from_ref(state).verify_access(&token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            ApiError::Unauthorized
        })?;

        match User::find_by_id(&state.db, claims.sub).await? {
            Some(user) if user.is_active => Ok(CurrentUser(user)),
            _ => {
                warn!(user_id = %claims.sub, "token subject missing or inactive");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSuperuser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_superuser {
            warn!(user_id = %user.id, "superuser route refused");
            return Err(ApiError::Forbidden);
        }
        Ok(CurrentSuperuser(user))
    }
}

/// Login credentials from an urlencoded or multipart form, or a JSON body.
pub struct LoginCredentials(pub LoginRequest);

#[async_trait]
impl<S> FromRequest<S> for LoginCredentials
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let JsonBody(credentials) = JsonBody::<LoginRequest>::from_request(req, state).await?;
            return Ok(Self(credentials));
        }
        if content_type.starts_with("multipart/form-data") {
            return read_multipart(req, state).await.map(Self);
        }

        let Form(credentials) = Form::<LoginRequest>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                FormRejection::FailedToDeserializeFormBody(e) => {
                    ApiError::Validation(e.body_text())
                }
                other => ApiError::Rejected(other.status(), other.body_text()),
            })?;
        Ok(Self(credentials))
    }
}

async fn read_multipart<S>(req: Request, state: &S) -> Result<LoginRequest, ApiError>
where
    S: Send + Sync,
{
    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|e| ApiError::Rejected(e.status(), e.body_text()))?;

    let (mut username, mut password) = (None, None);
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Rejected(e.status(), e.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        let slot = match name.as_deref() {
            Some("username") => &mut username,
            Some("password") => &mut password,
            _ => continue,
        };
        let text = field
            .text()
            .await
            .map_err(|e| ApiError::Rejected(e.status(), e.body_text()))?;
        *slot = Some(text);
    }

    match (username, password) {
        (Some(username), Some(password)) => Ok(LoginRequest { username, password }),
        (None, _) => Err(ApiError::Validation("missing field `username`".into())),
        (_, None) => Err(ApiError::Validation("missing field `password`".into())),
    }
}
