//! Server-side query injection.
//!
//! Middleware can attach values (an authenticated user id, a tenant) to the
//! inbound query string. The relay then carries them downstream: verbatim in
//! the query for GET, merged into JSON and form bodies otherwise.

use std::fmt::Display;

use axum::http::uri::PathAndQuery;
use axum::http::{Request, Uri};
use url::form_urlencoded;

/// Set `key` to `value` in the request's query, replacing earlier values.
///
/// The query is re-encoded, so existing parameters keep their values but
/// may change escaping (e.g. `%20` becomes `+`).
pub fn inject<B>(request: &mut Request<B>, key: &str, value: impl Display) -> Result<(), axum::http::Error> {
    let uri = request.uri();

    let mut pairs: Vec<(String, String)> = uri
        .query()
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .filter(|(k, _)| k != key)
                .collect()
        })
        .unwrap_or_default();
    pairs.push((key.to_string(), value.to_string()));

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&pairs)
        .finish();
    let path_and_query = PathAndQuery::try_from(format!("{}?{}", uri.path(), query))?;

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    *request.uri_mut() = Uri::from_parts(parts)?;

    Ok(())
}
