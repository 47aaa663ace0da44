//! HTTP request handlers for the bookmark routes
//!
//! Every failure is turned into a redirect carrying a flash message, or into a
//! JSON error body for the JSON endpoints. Nothing escapes as a bare 500.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use serde_json::json;
use tracing::{info, warn};

use crate::database::AppState;
use crate::error::{AppError, StoreError};
use crate::model::{BookmarkForm, SearchParams};
use crate::pages::{self, encode_segment};
use crate::service;
use crate::session::{CurrentSession, Flash};
use crate::storage::BookmarkBackend;

/// Queues `flash` for the session and redirects to `to`
pub(crate) async fn flash_redirect(
    state: &AppState,
    session: &CurrentSession,
    flash: Flash,
    to: &str,
) -> Response {
    state.sessions.flash(&session.id, flash).await;
    Redirect::to(to).into_response()
}

fn log_failure(operation: &str, err: &AppError) {
    match err {
        AppError::Store(StoreError::Unavailable { .. }) => {
            warn!(operation, error = %err, "storage failed on every backend")
        }
        _ => info!(operation, error = %err, "request rejected"),
    }
}

async fn render(
    state: &AppState,
    session: &CurrentSession,
    page: impl FnOnce(&[Flash]) -> Html<String>,
) -> Response {
    let flashes = state.sessions.take_flashes(&session.id).await;
    page(&flashes).into_response()
}

/// GET / - Landing page
pub async fn index(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Response {
    render(&state, &session, |flashes| pages::index(&session, flashes)).await
}

/// GET /add_page - Add-bookmark form
pub async fn add_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Response {
    render(&state, &session, |flashes| pages::add(&session, flashes)).await
}

/// GET /search_page - Search form
pub async fn search_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Response {
    render(&state, &session, |flashes| pages::search(&session, flashes)).await
}

/// POST /add - Creates a bookmark in the current user's scope
///
/// Form fields: `custom_name`, `url`, `notes` (optional). A URL without a
/// scheme gets `http://` prepended before validation. Always redirects back
/// to `/add_page`.
pub async fn add_bookmark(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Form(form): Form<BookmarkForm>,
) -> Response {
    let owner = session.owner();

    let flash = match service::add_bookmark(&*state.bookmarks, owner.as_deref(), &form) {
        Ok((name, _)) => Flash::success(format!("Bookmark \"{}\" was added successfully!", name)),
        Err(e) => {
            log_failure("add", &e);
            Flash::error(e.user_message())
        }
    };

    flash_redirect(&state, &session, flash, "/add_page").await
}

/// GET /search?search={name} - Resolves a name and redirects to its URL
///
/// Each successful resolution adds one visit. Unknown names redirect to the
/// search page with a not-found message and change nothing.
///
/// # Response
///
/// - **307 Temporary Redirect** - To the stored URL
/// - **303 See Other** - Back to `/search_page` on any failure
pub async fn search(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(params): Query<SearchParams>,
) -> Response {
    let name = params.search.unwrap_or_default();
    let owner = session.owner();

    match service::resolve_bookmark(&*state.bookmarks, owner.as_deref(), name.trim()) {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(e) => {
            log_failure("search", &e);
            flash_redirect(&state, &session, Flash::error(e.user_message()), "/search_page").await
        }
    }
}

fn listing_response(state: &AppState, session: &CurrentSession) -> Result<Response, Response> {
    let owner = session.owner();
    match state.bookmarks.list(owner.as_deref()) {
        Ok(bookmarks) => Ok(Json(bookmarks).into_response()),
        Err(e) => {
            let err = AppError::from(e);
            log_failure("list", &err);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": err.user_message() })),
            )
                .into_response())
        }
    }
}

/// GET /list_bookmarks - The current user's bookmarks as a `name -> bookmark` JSON object
pub async fn list_bookmarks(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Response {
    listing_response(&state, &session).unwrap_or_else(|err| err)
}

/// GET /export - Same data as `/list_bookmarks`, offered as a file download
pub async fn export_bookmarks(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Response {
    match listing_response(&state, &session) {
        Ok(response) => (
            [(
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"bookmarks.json\"",
            )],
            response,
        )
            .into_response(),
        Err(err) => err,
    }
}

/// POST /delete/{name} - Removes a bookmark from the current user's scope
pub async fn delete_bookmark(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(name): Path<String>,
) -> Response {
    let owner = session.owner();

    let flash = match state.bookmarks.delete(&name, owner.as_deref()) {
        Ok(()) => {
            info!(name = %name, "bookmark deleted");
            Flash::success(format!("Bookmark \"{}\" was deleted successfully!", name))
        }
        Err(e) => {
            let err = AppError::from(e);
            log_failure("delete", &err);
            Flash::error(err.user_message())
        }
    };

    flash_redirect(&state, &session, flash, "/search_page").await
}

/// GET /edit_page/{name} - Edit form prefilled with the stored values
pub async fn edit_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(name): Path<String>,
) -> Response {
    let owner = session.owner();

    match state.bookmarks.get(&name, owner.as_deref()) {
        Ok(bookmark) => {
            render(&state, &session, |flashes| {
                pages::edit(&session, flashes, &name, &bookmark)
            })
            .await
        }
        Err(e) => {
            let err = AppError::from(e);
            log_failure("edit_page", &err);
            flash_redirect(&state, &session, Flash::error(err.user_message()), "/search_page").await
        }
    }
}

/// POST /edit/{name} - Updates url and notes, renaming when `custom_name` differs
///
/// Validation failures return to the edit form; a missing bookmark returns to
/// the search page.
pub async fn edit_bookmark(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(name): Path<String>,
    Form(form): Form<BookmarkForm>,
) -> Response {
    let owner = session.owner();

    match service::edit_bookmark(&*state.bookmarks, owner.as_deref(), &name, &form) {
        Ok(_) => {
            flash_redirect(
                &state,
                &session,
                Flash::success("Bookmark updated successfully!"),
                "/search_page",
            )
            .await
        }
        Err(e) => {
            log_failure("edit", &e);
            let back_to = match e {
                AppError::Store(StoreError::NotFound) => "/search_page".to_string(),
                _ => format!("/edit_page/{}", encode_segment(&name)),
            };
            flash_redirect(&state, &session, Flash::error(e.user_message()), &back_to).await
        }
    }
}

/// GET /favicon/{name} - Placeholder icon for any bookmark
pub async fn favicon(Path(_name): Path<String>) -> Redirect {
    Redirect::to("/static/favicon.ico")
}
