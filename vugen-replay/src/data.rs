use indexmap::IndexMap;
use std::{collections::HashMap, path::PathBuf};

/// Request headers that take part in matching a live request against the recording.
///
/// `Method` and `Host` are not real header lines in the snapshot document but are stored and
/// compared alongside the others. Any header not listed here is ignored for matching.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RecognizedHeader {
    Method,
    Host,
    Referer,
    Cookie,
    ContentType,
}

impl RecognizedHeader {
    pub const ALL: [RecognizedHeader; 5] = [
        RecognizedHeader::Method,
        RecognizedHeader::Host,
        RecognizedHeader::Referer,
        RecognizedHeader::Cookie,
        RecognizedHeader::ContentType,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RecognizedHeader::Method => "Method",
            RecognizedHeader::Host => "Host",
            RecognizedHeader::Referer => "Referer",
            RecognizedHeader::Cookie => "Cookie",
            RecognizedHeader::ContentType => "Content-Type",
        }
    }
}

/// Response headers that are never replayed.
///
/// `Via` and `Proxy-Connection` are added when the recording went through a proxy, `Date` should
/// reflect the replay time and a replayed `Transfer-Encoding: chunked` has no chunked body behind
/// it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SkippedHeader {
    Via,
    ProxyConnection,
    Date,
    TransferEncoding,
}

impl SkippedHeader {
    pub const ALL: [SkippedHeader; 4] = [
        SkippedHeader::Via,
        SkippedHeader::ProxyConnection,
        SkippedHeader::Date,
        SkippedHeader::TransferEncoding,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SkippedHeader::Via => "Via",
            SkippedHeader::ProxyConnection => "Proxy-Connection",
            SkippedHeader::Date => "Date",
            SkippedHeader::TransferEncoding => "Transfer-Encoding",
        }
    }

    /// Exact, case-sensitive lookup, names are compared as captured.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|header| header.name() == name)
    }
}

pub const SET_COOKIE: &str = "Set-Cookie";

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RequestRecord {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RequestRecord {
    /// Builds a record holding every recognized header, missing ones as empty strings.
    ///
    /// `Method` is always taken from `method` and the body is dropped for anything but POST, so
    /// a recorded request and a live one are built the same way and compare equal.
    pub fn new<U, M, F>(url: U, method: M, mut header: F, body: Vec<u8>) -> Self
    where
        U: Into<String>,
        M: Into<String>,
        F: FnMut(RecognizedHeader) -> Option<String>,
    {
        let method = method.into();
        let mut headers = HashMap::new();

        for recognized in RecognizedHeader::ALL.iter().copied() {
            let value = match recognized {
                RecognizedHeader::Method => method.clone(),
                _ => header(recognized).unwrap_or_default(),
            };
            headers.insert(String::from(recognized.name()), value);
        }

        let body = if method == "POST" { body } else { Vec::new() };

        Self {
            url: url.into(),
            method,
            headers,
            body,
        }
    }

    pub fn header(&self, header: RecognizedHeader) -> &str {
        self.headers
            .get(header.name())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Recognized headers and body that differ between this (recorded) request and `live`.
    pub fn differences(&self, live: &RequestRecord) -> Vec<FieldDifference> {
        let mut differences: Vec<FieldDifference> = RecognizedHeader::ALL
            .iter()
            .copied()
            .filter(|header| self.header(*header) != live.header(*header))
            .map(|header| FieldDifference {
                field: String::from(header.name()),
                recorded: self.header(header).to_string(),
                live: live.header(header).to_string(),
            })
            .collect();

        if self.body != live.body {
            differences.push(FieldDifference {
                field: String::from(BODY_FIELD),
                recorded: describe_body(&self.body),
                live: describe_body(&live.body),
            });
        }

        differences
    }
}

const BODY_FIELD: &str = "Body";
const BODY_PREVIEW_CHARS: usize = 200;

fn describe_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut preview: String = text.chars().take(BODY_PREVIEW_CHARS).collect();
    if text.chars().count() > BODY_PREVIEW_CHARS {
        preview.push_str("...");
    }

    format!("{} bytes: {}", body.len(), preview)
}

/// One recognized header, or the body, of a recorded request that differs from the live one.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FieldDifference {
    pub field: String,
    pub recorded: String,
    pub live: String,
}

/// A recorded request with the live request's URL that still failed to match.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NearMiss {
    /// 1-based position of the recorded request in the recording.
    pub position: usize,
    pub differences: Vec<FieldDifference>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResponseRecord {
    /// The URL of the request this response answers, kept for diagnostics.
    pub url: String,
    pub status_code: u16,
    pub headers: IndexMap<String, String>,
    pub cookies: Vec<String>,
    pub payload_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn skipped_headers_are_matched_exactly() {
        for header in SkippedHeader::ALL.iter() {
            assert_eq!(SkippedHeader::from_name(header.name()), Some(*header));
        }

        assert_eq!(SkippedHeader::from_name("Set-Cookie"), None);
        assert_eq!(SkippedHeader::from_name("Content-Type"), None);
        assert_eq!(SkippedHeader::from_name("date"), None);
    }

    #[test]
    fn request_record_fills_missing_headers_with_empty_strings() {
        let record = RequestRecord::new(
            "http://example.test/",
            "GET",
            |header| match header {
                RecognizedHeader::Host => Some(String::from("example.test")),
                _ => None,
            },
            b"ignored".to_vec(),
        );

        assert_eq!(record.headers.len(), RecognizedHeader::ALL.len());
        assert_eq!(record.header(RecognizedHeader::Method), "GET");
        assert_eq!(record.header(RecognizedHeader::Host), "example.test");
        assert_eq!(record.header(RecognizedHeader::Referer), "");
        assert_eq!(record.header(RecognizedHeader::Cookie), "");
        assert_eq!(record.header(RecognizedHeader::ContentType), "");
        assert!(record.body.is_empty());
    }

    #[test]
    fn differences_list_changed_headers_and_body() {
        let recorded = RequestRecord::new(
            "http://example.test/login",
            "POST",
            |header| match header {
                RecognizedHeader::Cookie => Some(String::from("s=recorded")),
                _ => None,
            },
            b"user=a".to_vec(),
        );
        let live = RequestRecord::new(
            "http://example.test/login",
            "POST",
            |header| match header {
                RecognizedHeader::Cookie => Some(String::from("s=fresh")),
                _ => None,
            },
            b"user=b".to_vec(),
        );

        assert_eq!(
            recorded.differences(&live),
            vec![
                FieldDifference {
                    field: String::from("Cookie"),
                    recorded: String::from("s=recorded"),
                    live: String::from("s=fresh"),
                },
                FieldDifference {
                    field: String::from("Body"),
                    recorded: String::from("6 bytes: user=a"),
                    live: String::from("6 bytes: user=b"),
                },
            ]
        );
        assert!(recorded.differences(&recorded).is_empty());
    }

    #[test]
    fn request_record_keeps_post_body() {
        let record = RequestRecord::new("http://example.test/login", "POST", |_| None, b"a=1".to_vec());

        assert_eq!(record.body, b"a=1".to_vec());
    }
}
