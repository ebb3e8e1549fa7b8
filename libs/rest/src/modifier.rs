use std::fmt::Display;

use courier_core::to_query_string;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Request, Url};
use serde::Serialize;

use crate::error::Result;

/// Mutates an outgoing request before it is dispatched
///
/// Modifiers run in the order they are supplied, after the client has set
/// its default headers, so they can override any of them.
pub type RequestModifier = Box<dyn FnOnce(&mut Request) + Send>;

/// Box a closure as a [`RequestModifier`]
pub fn modifier<F>(f: F) -> RequestModifier
where
    F: FnOnce(&mut Request) + Send + 'static,
{
    Box::new(f)
}

/// Set a header, replacing any existing value
pub fn header(name: HeaderName, value: HeaderValue) -> RequestModifier {
    modifier(move |request| {
        request.headers_mut().insert(name, value);
    })
}

/// Set `Authorization: Bearer <token>`
pub fn bearer_auth(token: impl Display) -> Result<RequestModifier> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
    value.set_sensitive(true);
    Ok(header(AUTHORIZATION, value))
}

/// Append `data`, encoded as a query string, to the request's raw query
///
/// Encoding happens when the modifier runs. The encoded pairs are
/// concatenated onto any existing query without a separator, so this is
/// meant for URLs that carry no query of their own.
///
/// # Panics
///
/// The modifier panics if `data` is not a flat record. Use
/// [`try_query_parameters`] to get the encoding error up front instead.
pub fn query_parameters<T>(data: T) -> RequestModifier
where
    T: Serialize + Send + 'static,
{
    modifier(move |request| {
        let params = match to_query_string(&data) {
            Ok(params) => params,
            Err(e) => panic!("error creating query parameters: {}", e),
        };
        append_raw_query(request.url_mut(), &params);
    })
}

/// Like [`query_parameters`], but encodes `data` immediately
pub fn try_query_parameters<T>(data: &T) -> Result<RequestModifier>
where
    T: Serialize + ?Sized,
{
    let params = to_query_string(data)?;
    Ok(modifier(move |request| {
        append_raw_query(request.url_mut(), &params)
    }))
}

fn append_raw_query(url: &mut Url, params: &str) {
    if params.is_empty() {
        return;
    }

    let query = format!("{}{}", url.query().unwrap_or_default(), params);
    url.set_query(Some(&query));
}
