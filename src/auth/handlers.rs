use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenResponse},
        error::AuthError,
        jwt::AuthUser,
        repo_types::PublicUser,
    },
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    if !is_valid_email(&payload.email) {
        warn!("invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    let user = state
        .store
        .create_user(&payload.email, &payload.password, &payload.full_name)
        .await
        .map_err(reject)?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, (StatusCode, String)> {
    let user = state
        .store
        .authenticate(&payload.email, &payload.password)
        .await
        .map_err(reject)?;

    let token = state.tokens.issue_for(&user).map_err(reject)?;
    Ok(Json(TokenResponse::bearer(token)))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    match state.store.find_by_email(&email).await.map_err(reject)? {
        Some(user) => Ok(Json(user.into())),
        None => {
            warn!("token subject no longer exists");
            Err((StatusCode::UNAUTHORIZED, "User not found".into()))
        }
    }
}

fn reject(e: AuthError) -> (StatusCode, String) {
    let status = e.status();
    let msg = match e {
        AuthError::DuplicateUser => "User already exists".to_string(),
        AuthError::AuthenticationFailed => "Invalid credentials".to_string(),
        AuthError::StorageUnavailable(e) => {
            error!(error = %e, "credential store unavailable");
            "Service unavailable".to_string()
        }
        other => {
            error!(error = %other, "auth operation failed");
            "Internal error".to_string()
        }
    };
    (status, msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("a b@x.com"));
    }

    #[tokio::test]
    async fn register_login_roundtrip() {
        let state = test_state().await;

        let Json(user) = register(
            State(state.clone()),
            Json(RegisterRequest {
                email: "a@x.com".into(),
                password: "secret123".into(),
                full_name: "A".into(),
            }),
        )
        .await
        .expect("register");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.full_name, "A");

        let Json(tokens) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "a@x.com".into(),
                password: "secret123".into(),
            }),
        )
        .await
        .expect("login");
        assert_eq!(tokens.token_type, "bearer");
        assert_eq!(tokens.access_token.matches('.').count(), 2);
        let claims = state.tokens.verify(&tokens.access_token).unwrap();
        assert_eq!(claims["sub"], "a@x.com");

        let (status, body) = login(
            State(state),
            Json(LoginRequest {
                email: "a@x.com".into(),
                password: "wrong".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Invalid credentials");
    }

    #[tokio::test]
    async fn register_rejects_bad_email_and_duplicates() {
        let state = test_state().await;
        let req = |email: &str| {
            Json(RegisterRequest {
                email: email.into(),
                password: "pw".into(),
                full_name: String::new(),
            })
        };

        let (status, _) = register(State(state.clone()), req("nope")).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        register(State(state.clone()), req("d@x.com")).await.unwrap();
        let (status, body) = register(State(state), req("d@x.com")).await.unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, "User already exists");
    }

    #[test]
    fn rejections_never_echo_internals() {
        let (status, body) = reject(AuthError::Hashing("salt too short".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal error");
    }
}
