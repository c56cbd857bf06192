use crate::data::NearMiss;
use hyper::http;
use std::{fmt::Display, io, path::PathBuf};

#[derive(Debug)]
pub enum Error {
    MissingDescriptorFile(PathBuf),
    MalformedDescriptor {
        path: PathBuf,
        reason: String,
    },
    NoSnapshotsFound(PathBuf),
    MissingSnapshotDocument(PathBuf),
    InvalidSnapshotDocument {
        path: PathBuf,
        message: String,
    },
    InvalidEncodedValue {
        path: PathBuf,
        url: String,
        field: String,
    },
    UnparsableStatusLine {
        path: PathBuf,
        url: String,
        status_block: String,
    },
    RequestResponseCountMismatch {
        path: PathBuf,
        requests: usize,
        responses: usize,
    },
    NoMatchingResponse {
        url: String,
        known_urls: Vec<String>,
        near_misses: Vec<NearMiss>,
    },
    PayloadFileMissing {
        url: String,
        path: PathBuf,
    },
    ScriptFolderNotFound(PathBuf),
    InvalidScriptFolder {
        path: PathBuf,
        found: usize,
    },
    HostsNotLocal(Vec<String>),
    PortsNotListening(Vec<u16>),
    UnknownMimeType(String),
    IoError(io::Error),
    InvalidHeaderName,
    InvalidHeaderValue,
    InvalidBody,
    HyperError(hyper::Error),
    HttpError(http::Error),
}

impl Error {
    /// The HTTP status the replay server answers with when this error ends a request.
    ///
    /// A request outside the capture is an expected outcome and maps to 404; everything else is a
    /// broken recording or environment and maps to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NoMatchingResponse { .. } => 404,
            _ => 500,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Error::MissingDescriptorFile(_) => "Snapshot descriptor not found",
            Error::MalformedDescriptor { .. } => "Malformed snapshot descriptor",
            Error::NoSnapshotsFound(_) => "No recording snapshots found",
            Error::MissingSnapshotDocument(_) => "Snapshot document not found",
            Error::InvalidSnapshotDocument { .. } => "Invalid snapshot document",
            Error::InvalidEncodedValue { .. } => "Invalid encoded snapshot value",
            Error::UnparsableStatusLine { .. } => "Unparsable HTTP status line",
            Error::RequestResponseCountMismatch { .. } => "Request/response count mismatch",
            Error::NoMatchingResponse { .. } => "404 File Not Found",
            Error::PayloadFileMissing { .. } => "Response file not found",
            Error::ScriptFolderNotFound(_) => "VuGen script folder not found",
            Error::InvalidScriptFolder { .. } => "Unexpected VuGen script folder contents",
            Error::HostsNotLocal(_) => "Entries missing from hosts file",
            Error::PortsNotListening(_) => "One or more ports are not listening",
            Error::UnknownMimeType(_) => "Unknown MIME type",
            Error::IoError(_) => "I/O error",
            Error::InvalidHeaderName
            | Error::InvalidHeaderValue
            | Error::InvalidBody
            | Error::HyperError(_)
            | Error::HttpError(_) => "HTTP error",
        }
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingDescriptorFile(path) => {
                write!(f, "Could not find snapshot file: {}", path.display())
            }
            Error::MalformedDescriptor { path, reason } => {
                write!(f, "Malformed snapshot file {}: {}", path.display(), reason)
            }
            Error::NoSnapshotsFound(dir) => write!(
                f,
                "Could not find any snapshot files in: {}",
                dir.display()
            ),
            Error::MissingSnapshotDocument(path) => {
                write!(f, "Could not find snapshot document: {}", path.display())
            }
            Error::InvalidSnapshotDocument { path, message } => write!(
                f,
                "Snapshot document {} is invalid: {}",
                path.display(),
                message
            ),
            Error::InvalidEncodedValue { path, url, field } => write!(
                f,
                "Could not decode {} of {} in {}",
                field,
                url,
                path.display()
            ),
            Error::UnparsableStatusLine {
                path,
                url,
                status_block,
            } => write!(
                f,
                "Could not determine HTTP response code for {} in {}. Response header: {}",
                url,
                path.display(),
                status_block.escape_default()
            ),
            Error::RequestResponseCountMismatch {
                path,
                requests,
                responses,
            } => write!(
                f,
                "Number of HTTP requests ({}) does not match number of HTTP responses ({}) after loading {}",
                requests,
                responses,
                path.display()
            ),
            Error::NoMatchingResponse { url, known_urls, .. } => write!(
                f,
                "Could not find {}. The recording contains {} URLs",
                url,
                known_urls.len()
            ),
            Error::PayloadFileMissing { url, path } => write!(
                f,
                "Could not find response file {} for {}",
                path.display(),
                url
            ),
            Error::ScriptFolderNotFound(path) => write!(
                f,
                "Could not find directory {}. Creating directory now. Please copy a VuGen script to it and try again",
                path.display()
            ),
            Error::InvalidScriptFolder { path, found } => write!(
                f,
                "There must be one (and only one) script in the VuGen script folder {}, found {}",
                path.display(),
                found
            ),
            Error::HostsNotLocal(hosts) => write!(
                f,
                "These hosts do not resolve to 127.0.0.1: {}",
                hosts.join(", ")
            ),
            Error::PortsNotListening(ports) => write!(
                f,
                "These ports are not listening on localhost: {}",
                ports
                    .iter()
                    .map(|port| port.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Error::UnknownMimeType(extension) => write!(
                f,
                "Could not find MIME type for file extension \"{}\"",
                extension
            ),
            Error::IoError(e) => write!(f, "IoError: {}", e),
            Error::InvalidHeaderName => write!(f, "Invalid header name"),
            Error::InvalidHeaderValue => write!(f, "Invalid header value"),
            Error::InvalidBody => write!(f, "Invalid body"),
            Error::HyperError(e) => write!(f, "Hyper error: {}", e),
            Error::HttpError(e) => write!(f, "Http Error: {}", e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e)
    }
}

impl From<hyper::header::InvalidHeaderName> for Error {
    fn from(_: hyper::header::InvalidHeaderName) -> Self {
        Error::InvalidHeaderName
    }
}

impl From<hyper::header::InvalidHeaderValue> for Error {
    fn from(_: hyper::header::InvalidHeaderValue) -> Self {
        Error::InvalidHeaderValue
    }
}

impl From<hyper::Error> for Error {
    fn from(e: hyper::Error) -> Self {
        Error::HyperError(e)
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Error::HttpError(e)
    }
}
