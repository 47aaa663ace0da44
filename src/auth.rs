//! Account endpoints: signup, login and logout
//!
//! A successful signup or login attaches the user to a freshly issued
//! session; the user id then scopes every bookmark operation.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use chrono::Utc;
use tracing::{error, info};
use url::form_urlencoded;
use uuid::Uuid;

use crate::database::AppState;
use crate::error::{AppError, StoreError};
use crate::handler::flash_redirect;
use crate::model::{LoginForm, LoginParams, SignupForm, User};
use crate::pages;
use crate::session::{set_session_cookie, CurrentSession, Flash, SessionUser};
use crate::users::{hash_password, verify_password, UserStore};
use crate::validation::is_strong_password;

/// Only local absolute paths are accepted as post-login destinations
fn safe_return_path(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

/// Validates the form and stores a new account
pub fn register(users: &dyn UserStore, form: &SignupForm) -> Result<User, AppError> {
    let username = form.username.trim();
    let email = form.email.trim();
    if username.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidAccount);
    }
    if !is_strong_password(&form.password) {
        return Err(AppError::WeakPassword);
    }

    let password_hash = hash_password(&form.password).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        AppError::PasswordHash
    })?;

    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
        date_joined: Utc::now(),
    };
    users.create(&user)?;

    Ok(user)
}

/// Looks the user up and checks the password
///
/// An unknown username and a wrong password are indistinguishable to the caller.
pub fn authenticate(users: &dyn UserStore, username: &str, password: &str) -> Result<User, AppError> {
    let user = match users.find_by_username(username.trim()) {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(AppError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    if verify_password(password, &user.password_hash) {
        Ok(user)
    } else {
        Err(AppError::InvalidCredentials)
    }
}

fn session_user(user: &User) -> SessionUser {
    SessionUser {
        id: user.id,
        username: user.username.clone(),
    }
}

/// Logs `user` in under a new session id and redirects with the new cookie
async fn start_session(
    state: &AppState,
    session: &CurrentSession,
    user: &User,
    flash: Flash,
    to: &str,
) -> Response {
    let id = state.sessions.login(&session.id, session_user(user)).await;
    let logged_in = CurrentSession {
        id,
        user: Some(session_user(user)),
    };

    let mut response = flash_redirect(state, &logged_in, flash, to).await;
    set_session_cookie(&mut response, &logged_in.id);
    response
}

/// GET /login - Login form; `next` is carried into the form
pub async fn login_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(params): Query<LoginParams>,
) -> Response {
    if session.user.is_some() {
        return Redirect::to(safe_return_path(params.next.as_deref())).into_response();
    }

    let flashes = state.sessions.take_flashes(&session.id).await;
    pages::login(&session, &flashes, params.next.as_deref()).into_response()
}

/// POST /login - Checks credentials and starts the logged-in session
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Form(form): Form<LoginForm>,
) -> Response {
    match authenticate(&*state.users, &form.username, &form.password) {
        Ok(user) => {
            info!(username = %user.username, "user logged in");
            start_session(
                &state,
                &session,
                &user,
                Flash::success("Logged in successfully."),
                safe_return_path(form.next.as_deref()),
            )
            .await
        }
        Err(e) => {
            info!(username = %form.username, error = %e, "login rejected");
            let message = e.user_message();
            let back_to = match form.next.as_deref() {
                Some(next) => {
                    let encoded: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
                    format!("/login?next={}", encoded)
                }
                None => "/login".to_string(),
            };
            flash_redirect(&state, &session, Flash::error(message), &back_to).await
        }
    }
}

/// GET /signup - Signup form
pub async fn signup_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Response {
    let flashes = state.sessions.take_flashes(&session.id).await;
    pages::signup(&session, &flashes).into_response()
}

/// POST /signup - Creates the account and logs it in
pub async fn signup(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Form(form): Form<SignupForm>,
) -> Response {
    match register(&*state.users, &form) {
        Ok(user) => {
            info!(username = %user.username, "account created");
            start_session(
                &state,
                &session,
                &user,
                Flash::success("Account created successfully!"),
                "/",
            )
            .await
        }
        Err(e) => {
            info!(username = %form.username, error = %e, "signup rejected");
            let message = match &e {
                AppError::Store(StoreError::NameTaken) => "Username already taken.".to_string(),
                other => other.user_message(),
            };
            flash_redirect(&state, &session, Flash::error(message), "/signup").await
        }
    }
}

/// GET /logout - Ends the logged-in session
///
/// The session is dropped; the goodbye flash starts a new anonymous one under
/// the same cookie.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Response {
    state.sessions.logout(&session.id).await;
    info!("user logged out");
    flash_redirect(&state, &session, Flash::success("You have been logged out."), "/").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::JsonUserStore;
    use tempfile::TempDir;

    fn signup_form(username: &str, password: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: password.to_string(),
        }
    }

    #[test]
    fn register_then_authenticate() {
        let dir = TempDir::new().unwrap();
        let users = JsonUserStore::new(dir.path().join("users.json"));

        let created = register(&users, &signup_form("alice", "password123")).unwrap();
        let user = authenticate(&users, "alice", "password123").unwrap();
        assert_eq!(user.id, created.id);

        assert!(matches!(
            authenticate(&users, "alice", "password124"),
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&users, "nobody", "password123"),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn register_rejects_weak_passwords_and_duplicates() {
        let dir = TempDir::new().unwrap();
        let users = JsonUserStore::new(dir.path().join("users.json"));

        assert!(matches!(
            register(&users, &signup_form("alice", "short")),
            Err(AppError::WeakPassword)
        ));
        register(&users, &signup_form("alice", "password123")).unwrap();
        assert!(matches!(
            register(&users, &signup_form("alice", "password456")),
            Err(AppError::Store(StoreError::NameTaken))
        ));
    }

    #[test]
    fn return_path_must_be_local() {
        assert_eq!(safe_return_path(Some("/edit_page/docs")), "/edit_page/docs");
        assert_eq!(safe_return_path(Some("//evil.example")), "/");
        assert_eq!(safe_return_path(Some("https://evil.example")), "/");
        assert_eq!(safe_return_path(None), "/");
    }
}
