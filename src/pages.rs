//! Minimal HTML for the form pages
//!
//! Pages are plain strings; every user-supplied value goes through [`escape`].

use axum::response::Html;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::model::Bookmark;
use crate::session::{CurrentSession, Flash};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Everything outside the RFC 3986 unreserved set
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encodes a value for use as one URL path segment
pub fn encode_segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

fn layout(title: &str, session: &CurrentSession, flashes: &[Flash], body: &str) -> Html<String> {
    let nav = match &session.user {
        Some(user) => format!(
            r#"<a href="/add_page">Add</a> <a href="/search_page">Search</a> <a href="/export">Export</a> <span>{}</span> <a href="/logout">Log out</a>"#,
            escape(&user.username)
        ),
        None => r#"<a href="/search_page">Search</a> <a href="/login">Log in</a> <a href="/signup">Sign up</a>"#
            .to_string(),
    };

    let messages: String = flashes
        .iter()
        .map(|flash| {
            format!(
                r#"<p class="flash {}">{}</p>"#,
                flash.kind.as_str(),
                escape(&flash.message)
            )
        })
        .collect();

    Html(format!(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
<nav><a href="/">Home</a> {nav}</nav>
{messages}
{body}
</body>
</html>"#,
        title = escape(title),
    ))
}

pub fn index(session: &CurrentSession, flashes: &[Flash]) -> Html<String> {
    layout(
        "Bookmarks",
        session,
        flashes,
        "<h1>Bookmarks</h1><p>Give your links short names and jump to them by name.</p>",
    )
}

pub fn login(session: &CurrentSession, flashes: &[Flash], next: Option<&str>) -> Html<String> {
    let next_field = next
        .map(|next| format!(r#"<input type="hidden" name="next" value="{}">"#, escape(next)))
        .unwrap_or_default();
    let body = format!(
        r#"<h1>Log in</h1>
<form method="post" action="/login">
{next_field}
<label>Username <input name="username" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Log in</button>
</form>"#
    );
    layout("Log in", session, flashes, &body)
}

pub fn signup(session: &CurrentSession, flashes: &[Flash]) -> Html<String> {
    layout(
        "Sign up",
        session,
        flashes,
        r#"<h1>Sign up</h1>
<form method="post" action="/signup">
<label>Username <input name="username" required></label>
<label>Email <input name="email" type="email" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Create account</button>
</form>"#,
    )
}

pub fn add(session: &CurrentSession, flashes: &[Flash]) -> Html<String> {
    layout(
        "Add bookmark",
        session,
        flashes,
        r#"<h1>Add bookmark</h1>
<form method="post" action="/add">
<label>Name <input name="custom_name" required></label>
<label>URL <input name="url" required></label>
<label>Notes <textarea name="notes"></textarea></label>
<button type="submit">Save</button>
</form>"#,
    )
}

pub fn search(session: &CurrentSession, flashes: &[Flash]) -> Html<String> {
    layout(
        "Search",
        session,
        flashes,
        r#"<h1>Open a bookmark</h1>
<form method="get" action="/search">
<label>Name <input name="search" required></label>
<button type="submit">Go</button>
</form>"#,
    )
}

pub fn edit(
    session: &CurrentSession,
    flashes: &[Flash],
    name: &str,
    bookmark: &Bookmark,
) -> Html<String> {
    let segment = encode_segment(name);
    let name = escape(name);
    let body = format!(
        r#"<h1>Edit {name}</h1>
<form method="post" action="/edit/{segment}">
<label>Name <input name="custom_name" value="{name}" required></label>
<label>URL <input name="url" value="{url}" required></label>
<label>Notes <textarea name="notes">{notes}</textarea></label>
<button type="submit">Save</button>
</form>
<form method="post" action="/delete/{segment}"><button type="submit">Delete</button></form>
<p>Visits: {visits}</p>"#,
        url = escape(&bookmark.url),
        notes = escape(&bookmark.notes),
        visits = bookmark.visits,
    );
    layout("Edit bookmark", session, flashes, &body)
}
