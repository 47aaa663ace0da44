use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use tracing::debug;
use url::form_urlencoded;

use crate::database::AppState;
use crate::session::{session_cookie, set_session_cookie, CurrentSession};

/// Attaches a [`CurrentSession`] to every request
///
/// Visitors without a live session cookie get a fresh id. The cookie is only
/// sent once the handler stored something under that id.
pub async fn load_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie = session_cookie(request.headers()).map(str::to_string);
    let (session, created) = state.sessions.resolve(cookie.as_deref()).await;
    let session_id = session.id.clone();
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;

    if created && state.sessions.contains(&session_id).await {
        debug!("new session issued");
        set_session_cookie(&mut response, &session_id);
    }

    response
}

/// Lets logged-in visitors through and sends everyone else to the login page
///
/// The requested path (and query) travels along as `next` so the login handler
/// can return there.
pub async fn require_login(
    Extension(session): Extension<CurrentSession>,
    request: Request,
    next: Next,
) -> Response {
    if session.user.is_some() {
        return next.run(request).await;
    }

    let return_path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let encoded: String = form_urlencoded::byte_serialize(return_path.as_bytes()).collect();

    Redirect::to(&format!("/login?next={}", encoded)).into_response()
}
