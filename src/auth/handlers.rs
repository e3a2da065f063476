use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{RefreshRequest, RegisterRequest, TokenResponse, UserRead, UserUpdate},
        extractors::{CurrentSuperuser, CurrentUser, LoginCredentials},
        jwt::JwtKeys,
        repo::{User, UserChanges, UserRepository},
        services::{
            authenticate, hash_password, is_valid_email, normalize_email, MIN_PASSWORD_LEN,
        },
    },
    config::AppConfig,
    error::ApiError,
    extract::{IdPath, JsonBody},
    state::AppState,
};

const USER_NOT_FOUND: ApiError = ApiError::NotFound("User");

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/users/me", get(get_me).patch(update_me))
        .route(
            "/auth/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

fn issue_tokens(keys: &JwtKeys, user: &User) -> anyhow::Result<TokenResponse> {
    Ok(TokenResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        token_type: "bearer".into(),
    })
}

fn auth_cookie(config: &AppConfig, access_token: String) -> Cookie<'static> {
    Cookie::build((config.cookie.name.clone(), access_token))
        .path("/")
        .http_only(true)
        .secure(config.cookie.secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(config.jwt.ttl_minutes))
        .build()
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<UserRead>), ApiError> {
    let email = normalize_email(&payload.email);

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::BadRequest("REGISTER_INVALID_EMAIL"));
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::BadRequest("REGISTER_INVALID_PASSWORD"));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::BadRequest("REGISTER_USER_ALREADY_EXISTS"));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &email, &hash, false).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(UserRead::from(user))))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    LoginCredentials(payload): LoginCredentials,
) -> Result<(CookieJar, Json<TokenResponse>), ApiError> {
    let user = authenticate(&state.db, &payload.username, &payload.password)
        .await?
        .ok_or(ApiError::BadRequest("LOGIN_BAD_CREDENTIALS"))?;

    let tokens = issue_tokens(&JwtKeys::from_ref(&state), &user)?;
    let jar = jar.add(auth_cookie(&state.config, tokens.access_token.clone()));

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((jar, Json(tokens)))
}

#[instrument(skip(state, jar, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        ApiError::Unauthorized
    })?;

    let user = match User::find_by_id(&state.db, claims.sub).await? {
        Some(user) if user.is_active => user,
        _ => {
            warn!(user_id = %claims.sub, "refresh for missing or inactive user");
            return Err(ApiError::Unauthorized);
        }
    };

    let tokens = issue_tokens(&keys, &user)?;
    let jar = jar.add(auth_cookie(&state.config, tokens.access_token.clone()));
    Ok((jar, Json(tokens)))
}

#[instrument(skip(state, user, jar))]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    let removal = Cookie::build((state.config.cookie.name.clone(), "")).path("/");
    info!(user_id = %user.id, "user logged out");
    (jar.remove(removal), StatusCode::NO_CONTENT)
}

#[instrument(skip(user))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserRead> {
    Json(UserRead::from(user))
}

/// Validate `update` against `target` and hash any new password.
///
/// With `privileged` unset the account flags are dropped, so callers can
/// only change their own email and password. A changed email clears
/// `is_verified` unless the update sets it explicitly.
async fn resolve_changes(
    users: &UserRepository,
    target: &User,
    update: UserUpdate,
    privileged: bool,
) -> Result<UserChanges, ApiError> {
    let mut changes = UserChanges::default();
    if privileged {
        changes.is_active = update.is_active;
        changes.is_superuser = update.is_superuser;
        changes.is_verified = update.is_verified;
    }

    if let Some(password) = update.password {
        if password.len() < MIN_PASSWORD_LEN {
            warn!(user_id = %target.id, "password too short");
            return Err(ApiError::BadRequest("UPDATE_USER_INVALID_PASSWORD"));
        }
        changes.hashed_password = Some(hash_password(&password)?);
    }

    if let Some(email) = update.email {
        let email = normalize_email(&email);
        if email != target.email {
            if !is_valid_email(&email) {
                return Err(ApiError::Validation(format!("invalid email address: {email}")));
            }
            if User::find_by_email(users.pool(), &email).await?.is_some() {
                warn!(email = %email, "email already registered");
                return Err(ApiError::BadRequest("UPDATE_USER_EMAIL_ALREADY_EXISTS"));
            }
            changes.is_verified = changes.is_verified.or(Some(false));
            changes.email = Some(email);
        }
    }
    Ok(changes)
}

#[instrument(skip(users, user, update))]
pub async fn update_me(
    State(users): State<UserRepository>,
    CurrentUser(user): CurrentUser,
    JsonBody(update): JsonBody<UserUpdate>,
) -> Result<Json<UserRead>, ApiError> {
    let changes = resolve_changes(&users, &user, update, false).await?;
    let updated = users.update(user.id, changes).await?.ok_or(USER_NOT_FOUND)?;
    info!(user_id = %updated.id, "user updated own account");
    Ok(Json(UserRead::from(updated)))
}

#[instrument(skip(users))]
pub async fn get_user(
    State(users): State<UserRepository>,
    CurrentSuperuser(_): CurrentSuperuser,
    IdPath(id): IdPath<Uuid>,
) -> Result<Json<UserRead>, ApiError> {
    let user = users.find(id).await?.ok_or(USER_NOT_FOUND)?;
    Ok(Json(UserRead::from(user)))
}

#[instrument(skip(users, admin, update))]
pub async fn update_user(
    State(users): State<UserRepository>,
    CurrentSuperuser(admin): CurrentSuperuser,
    IdPath(id): IdPath<Uuid>,
    JsonBody(update): JsonBody<UserUpdate>,
) -> Result<Json<UserRead>, ApiError> {
    let target = users.find(id).await?.ok_or(USER_NOT_FOUND)?;
    let changes = resolve_changes(&users, &target, update, true).await?;
    let updated = users.update(id, changes).await?.ok_or(USER_NOT_FOUND)?;
    info!(user_id = %updated.id, admin_id = %admin.id, "user updated");
    Ok(Json(UserRead::from(updated)))
}

#[instrument(skip(users, admin))]
pub async fn delete_user(
    State(users): State<UserRepository>,
    CurrentSuperuser(admin): CurrentSuperuser,
    IdPath(id): IdPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !users.delete(id).await? {
        return Err(USER_NOT_FOUND);
    }
    info!(user_id = %id, admin_id = %admin.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
