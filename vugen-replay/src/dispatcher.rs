use crate::{
    data::{ResponseRecord, SET_COOKIE},
    error::Error,
    mime::MimeTable,
    util,
};
use hyper::{
    header::{self, HeaderValue},
    Body, Response,
};
use std::fs;

/// Renders a recorded response: status, recorded headers, one `Set-Cookie` per recorded cookie
/// and the saved payload.
///
/// `Content-Length` always describes the bytes actually sent. A payload without a recorded
/// `Content-Type` gets one from `mime_table` when a table is configured.
pub fn dispatch(
    response: &ResponseRecord,
    mime_table: Option<&MimeTable>,
) -> Result<Response<Body>, Error> {
    let payload = match &response.payload_path {
        Some(path) if !path.is_file() => {
            return Err(Error::PayloadFileMissing {
                url: response.url.clone(),
                path: path.clone(),
            })
        }
        Some(path) => Some(fs::read(path)?),
        None => None,
    };

    let mut response_builder = Response::builder().status(response.status_code);
    let headers_mut = response_builder.headers_mut().ok_or(Error::InvalidBody)?;

    util::put_headers(
        headers_mut,
        response
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(header::CONTENT_LENGTH.as_str())),
    )?;

    let set_cookie = String::from(SET_COOKIE);
    util::put_headers(
        headers_mut,
        response.cookies.iter().map(|cookie| (&set_cookie, cookie)),
    )?;

    let body = payload.unwrap_or_default();

    if !body.is_empty() && !headers_mut.contains_key(header::CONTENT_TYPE) {
        if let Some(mime_table) = mime_table {
            let mime_type = mime_table.for_url(&response.url)?;
            headers_mut.insert(header::CONTENT_TYPE, HeaderValue::from_str(mime_type)?);
        }
    }

    headers_mut.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));

    Ok(response_builder.body(Body::from(body))?)
}
