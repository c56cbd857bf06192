use crate::{
    data::{RecognizedHeader, RequestRecord},
    error::Error,
};
use hyper::{
    header::{self, HeaderName, HeaderValue},
    http::request::Parts,
    HeaderMap,
};

const FORWARDED_PROTO: &str = "x-forwarded-proto";

pub fn put_headers<'a, I: IntoIterator<Item = (&'a String, &'a String)>>(
    header_map: &mut HeaderMap<HeaderValue>,
    headers: I,
) -> Result<(), Error> {
    for (key, value) in headers {
        let header_name = HeaderName::from_lowercase(key.to_lowercase().as_bytes())?;
        let header_value = HeaderValue::from_str(value)?;
        header_map.append(header_name, header_value);
    }

    Ok(())
}

fn header_str<'a>(header_map: &'a HeaderMap, name: &str) -> Option<&'a str> {
    // it currently ignores header values with opaque characters
    header_map.get(name).and_then(|value| value.to_str().ok())
}

/// Rebuilds the request the way the recorder saw it: absolute URL, recognized headers and, for
/// POST, the raw body.
///
/// `default_scheme` is used unless the request carries `X-Forwarded-Proto`. An absolute-form
/// request URI supplies its own scheme and authority. Ports 80 and 443 are left out of the URL.
pub fn live_request(parts: &Parts, body: Vec<u8>, default_scheme: &str) -> RequestRecord {
    let (scheme, authority) = match (parts.uri.scheme_str(), parts.uri.authority()) {
        (Some(scheme), Some(authority)) => (scheme, authority.as_str()),
        _ => (
            header_str(&parts.headers, FORWARDED_PROTO).unwrap_or(default_scheme),
            header_str(&parts.headers, header::HOST.as_str())
                .or_else(|| parts.uri.authority().map(|authority| authority.as_str()))
                .unwrap_or(""),
        ),
    };
    let (server_name, port) = split_authority(authority);
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|path_and_query| path_and_query.as_str())
        .unwrap_or("/");

    let url = match port {
        Some(port) if port != 80 && port != 443 => {
            format!("{}://{}:{}{}", scheme, server_name, port, path_and_query)
        }
        _ => format!("{}://{}{}", scheme, server_name, path_and_query),
    };

    let headers = &parts.headers;
    RequestRecord::new(
        url,
        parts.method.as_str(),
        |recognized| match recognized {
            RecognizedHeader::Method => None,
            RecognizedHeader::Host => Some(server_name.to_string()),
            other => header_str(headers, other.name()).map(String::from),
        },
        body,
    )
}

fn split_authority(authority: &str) -> (&str, Option<u16>) {
    if let Some((name, port)) = authority.rsplit_once(':') {
        // a bare IPv6 address has colons but no port
        if !name.contains(':') || name.ends_with(']') {
            if let Ok(port) = port.parse() {
                return (name, Some(port));
            }
        }
    }

    (authority, None)
}
