//! Personal URL bookmarking service
//!
//! Users map memorable names to URLs and resolve them later. Bookmarks live in
//! an embedded document database, with a JSON file taking over whenever that
//! database cannot serve a request.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod pages;
pub mod route;
pub mod service;
pub mod session;
pub mod storage;
pub mod users;
pub mod validation;
