//! Route definitions for the bookmarking service
//!
//! This module maps every HTTP route to its handler and wires the session and
//! login middleware around them.

use axum::routing::{get, post};
use axum::{middleware, Router};

use crate::auth::{login, login_page, logout, signup, signup_page};
use crate::database::AppState;
use crate::handler::{
    add_bookmark, add_page, delete_bookmark, edit_bookmark, edit_page, export_bookmarks, favicon,
    index, list_bookmarks, search, search_page,
};
use crate::middleware::{load_session, require_login};

/// Creates and configures the application router with all routes
///
/// # Route Definitions
///
/// Public:
/// - `GET /` - Landing page
/// - `GET|POST /login`, `GET|POST /signup` - Account forms
/// - `GET /search_page` - Search form
/// - `GET /search?search={name}` - Resolves a name and redirects to its URL
/// - `GET /favicon/{name}` - Placeholder icon
///
/// Login required (others are redirected to `/login?next=...`):
/// - `GET /logout`
/// - `GET /add_page`, `POST /add`
/// - `GET /list_bookmarks`, `GET /export`
/// - `POST /delete/{name}`
/// - `GET /edit_page/{name}`, `POST /edit/{name}`
///
/// # Example Usage
///
/// ```no_run
/// # use bookmarker::config::Config;
/// # use bookmarker::database::AppState;
/// # use bookmarker::route::create_app;
/// let state = AppState::from_config(&Config::default());
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/logout", get(logout))
        .route("/add_page", get(add_page))
        .route("/add", post(add_bookmark))
        .route("/list_bookmarks", get(list_bookmarks))
        .route("/export", get(export_bookmarks))
        .route("/delete/{name}", post(delete_bookmark))
        .route("/edit_page/{name}", get(edit_page))
        .route("/edit/{name}", post(edit_bookmark))
        .route_layer(middleware::from_fn(require_login));

    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page).post(login))
        .route("/signup", get(signup_page).post(signup))
        .route("/search_page", get(search_page))
        .route("/search", get(search))
        .route("/favicon/{name}", get(favicon))
        .merge(protected)
        // Outermost: every handler and the login guard see a CurrentSession
        .layer(middleware::from_fn_with_state(state.clone(), load_session))
        .with_state(state)
}
