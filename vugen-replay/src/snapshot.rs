//! Snapshot XML documents written by the recorder.
//!
//! A document holds one `HTTPTask` per recorded request. The task of a page contains the tasks
//! of its resources, so the tree is flattened in document order before use:
//!
//! ```text
//! HTTPSnapshot
//! +-HTTPTask (hostname, url)
//!   +-HTTPRequest (method)
//!   | +-HTTPHeaders
//!   | | +-HTTPHeaderEntity (name) / HTTPDataSet / HTTPData / ActualData (base64)
//!   | +-HTTPBody / HTTPDataSet / HTTPData / ActualData (POST only)
//!   +-HTTPResponse
//!   | +-HTTPHeaders
//!   |   +-HTTPAllHeaders / HTTPDataSet / HTTPData / ActualData (raw status line and headers)
//!   |   +-HTTPHeaderEntity ...
//!   +-HTTPTask ...
//! ```

use crate::{
    data::{RecognizedHeader, RequestRecord, SkippedHeader, SET_COOKIE},
    error::Error,
};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

lazy_static! {
    static ref STATUS_LINE_REGEX: Regex =
        Regex::new(r"^\s*HTTP/[0-9]+(?:\.[0-9]+)? (?P<status_code>[0-9]{3})\b").unwrap();
}

const ACTUAL_DATA: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Deserialize, Default)]
struct SnapshotDocument {
    #[serde(rename = "HTTPTask", default)]
    tasks: Vec<HttpTask>,
}

#[derive(Debug, Deserialize)]
struct HttpTask {
    #[serde(rename = "@hostname")]
    hostname: String,
    #[serde(rename = "@url")]
    url: String,
    #[serde(rename = "HTTPRequest")]
    request: HttpRequestNode,
    #[serde(rename = "HTTPResponse")]
    response: HttpResponseNode,
    #[serde(rename = "HTTPTask", default)]
    tasks: Vec<HttpTask>,
}

#[derive(Debug, Deserialize)]
struct HttpRequestNode {
    #[serde(rename = "@method")]
    method: String,
    #[serde(rename = "HTTPHeaders", default)]
    headers: HttpHeaders,
    #[serde(rename = "HTTPBody")]
    body: Option<DataHolder>,
}

#[derive(Debug, Deserialize)]
struct HttpResponseNode {
    #[serde(rename = "HTTPHeaders", default)]
    headers: HttpHeaders,
}

#[derive(Debug, Deserialize, Default)]
struct HttpHeaders {
    #[serde(rename = "HTTPAllHeaders")]
    all_headers: Option<DataHolder>,
    #[serde(rename = "HTTPHeaderEntity", default)]
    entities: Vec<HeaderEntity>,
}

#[derive(Debug, Deserialize)]
struct HeaderEntity {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "HTTPDataSet", default)]
    data_set: DataSet,
}

#[derive(Debug, Deserialize, Default)]
struct DataHolder {
    #[serde(rename = "HTTPDataSet", default)]
    data_set: DataSet,
}

#[derive(Debug, Deserialize, Default)]
struct DataSet {
    #[serde(rename = "HTTPData", default)]
    data: Vec<HttpData>,
}

#[derive(Debug, Deserialize, Default)]
struct HttpData {
    #[serde(rename = "ActualData", default)]
    actual_data: String,
}

impl DataSet {
    /// Concatenation of every `ActualData` chunk, base64 decoded.
    fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let mut decoded = Vec::new();

        for chunk in &self.data {
            let encoded: String = chunk
                .actual_data
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            decoded.extend(ACTUAL_DATA.decode(encoded)?);
        }

        Ok(decoded)
    }
}

/// Status line, headers and cookies of one recorded response.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SnapshotResponse {
    pub status_code: u16,
    pub headers: IndexMap<String, String>,
    pub cookies: Vec<String>,
}

/// One `HTTPTask` node, already decoded.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SnapshotNode {
    pub hostname: String,
    pub url: String,
    pub request: RequestRecord,
    pub response: SnapshotResponse,
}

pub fn load_snapshot_document<P: AsRef<Path>>(path: P) -> Result<Vec<SnapshotNode>, Error> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(Error::MissingSnapshotDocument(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path)?;
    parse_snapshot_document(path, &contents)
}

/// Parses a snapshot document and returns every task node, at any depth, in document order.
pub fn parse_snapshot_document<P: AsRef<Path>>(
    path: P,
    contents: &str,
) -> Result<Vec<SnapshotNode>, Error> {
    let path = path.as_ref();
    let document: SnapshotDocument =
        quick_xml::de::from_str(contents).map_err(|e| Error::InvalidSnapshotDocument {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut tasks = Vec::new();
    flatten_tasks(&document.tasks, &mut tasks);

    let decoder = NodeDecoder { path };
    tasks.into_iter().map(|task| decoder.decode(task)).collect()
}

fn flatten_tasks<'a>(tasks: &'a [HttpTask], flattened: &mut Vec<&'a HttpTask>) {
    for task in tasks {
        flattened.push(task);
        flatten_tasks(&task.tasks, flattened);
    }
}

struct NodeDecoder<'a> {
    path: &'a Path,
}

impl NodeDecoder<'_> {
    fn decode(&self, task: &HttpTask) -> Result<SnapshotNode, Error> {
        Ok(SnapshotNode {
            hostname: task.hostname.clone(),
            url: task.url.clone(),
            request: self.decode_request(task)?,
            response: self.decode_response(task)?,
        })
    }

    fn decode_request(&self, task: &HttpTask) -> Result<RequestRecord, Error> {
        let headers = &task.request.headers;

        let referer = self.request_header(task, headers, RecognizedHeader::Referer.name())?;
        let cookie = self.request_header(task, headers, RecognizedHeader::Cookie.name())?;
        let content_type =
            self.request_header(task, headers, RecognizedHeader::ContentType.name())?;
        let content_length = self
            .request_header(task, headers, "Content-Length")?
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(0);

        if let Some(host) = self.request_header(task, headers, RecognizedHeader::Host.name())? {
            let host_name = host.split(':').next().unwrap_or("");
            if host_name != task.hostname {
                warn!(
                    "Host header {} of {} differs from the recorded hostname {}",
                    host, task.url, task.hostname
                );
            }
        }

        let body = match &task.request.body {
            Some(body) if task.request.method == "POST" && content_length > 0 => body
                .data_set
                .decode()
                .map_err(|_| self.invalid_value(task, "request body"))?,
            _ => Vec::new(),
        };

        let recognized = |header: RecognizedHeader| match header {
            RecognizedHeader::Host => Some(task.hostname.clone()),
            RecognizedHeader::Referer => referer.clone(),
            RecognizedHeader::Cookie => cookie.clone(),
            RecognizedHeader::ContentType => content_type.clone(),
            RecognizedHeader::Method => None,
        };

        Ok(RequestRecord::new(
            task.url.as_str(),
            task.request.method.as_str(),
            recognized,
            body,
        ))
    }

    fn decode_response(&self, task: &HttpTask) -> Result<SnapshotResponse, Error> {
        let headers = &task.response.headers;

        let status_block = match &headers.all_headers {
            Some(all_headers) => all_headers
                .data_set
                .decode()
                .map_err(|_| self.invalid_value(task, "response status line"))?,
            None => Vec::new(),
        };
        let status_block = String::from_utf8_lossy(&status_block);
        let status_code = parse_status_code(&status_block).ok_or_else(|| {
            Error::UnparsableStatusLine {
                path: self.path.to_path_buf(),
                url: task.url.clone(),
                status_block: status_block.to_string(),
            }
        })?;

        let mut response_headers = IndexMap::new();
        let mut cookies = Vec::new();

        for entity in &headers.entities {
            if SkippedHeader::from_name(&entity.name).is_some() {
                continue;
            }

            let value = self.entity_value(task, entity)?;
            if entity.name == SET_COOKIE {
                cookies.push(value);
            } else {
                response_headers.insert(entity.name.clone(), value);
            }
        }

        Ok(SnapshotResponse {
            status_code,
            headers: response_headers,
            cookies,
        })
    }

    /// Decoded value of the first request header entity called `name`.
    fn request_header(
        &self,
        task: &HttpTask,
        headers: &HttpHeaders,
        name: &str,
    ) -> Result<Option<String>, Error> {
        headers
            .entities
            .iter()
            .find(|entity| entity.name == name)
            .map(|entity| self.entity_value(task, entity))
            .transpose()
    }

    fn entity_value(&self, task: &HttpTask, entity: &HeaderEntity) -> Result<String, Error> {
        let decoded = entity
            .data_set
            .decode()
            .map_err(|_| self.invalid_value(task, &format!("header {}", entity.name)))?;

        Ok(String::from_utf8_lossy(&decoded).trim().to_string())
    }

    fn invalid_value(&self, task: &HttpTask, field: &str) -> Error {
        Error::InvalidEncodedValue {
            path: PathBuf::from(self.path),
            url: task.url.clone(),
            field: field.to_string(),
        }
    }
}

/// Status code of a raw `HTTP/<version> <code> ...` block, if it carries a valid one.
pub fn parse_status_code(status_block: &str) -> Option<u16> {
    STATUS_LINE_REGEX
        .captures(status_block)
        .and_then(|captures| captures["status_code"].parse().ok())
        .filter(|status_code| (100..=599).contains(status_code))
}
