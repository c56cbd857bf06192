use crate::{
    data::{RequestRecord, ResponseRecord},
    descriptor::{load_descriptor, Descriptor},
    error::Error,
    snapshot::{load_snapshot_document, SnapshotNode},
};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};

lazy_static! {
    static ref DESCRIPTOR_FILE_REGEX: Regex = Regex::new(r"^t.*\.inf$").unwrap();
}

const DATA_FOLDER: &str = "data";

/// Every recorded request of a script with the response that answered it.
///
/// `requests[i]` is answered by `responses[i]`; both sequences always have the same length.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Recording {
    requests: Vec<RequestRecord>,
    responses: Vec<ResponseRecord>,
}

impl Recording {
    /// Loads every `t*.inf` descriptor under `<script_folder>/data`, in file name order.
    pub fn load<P: AsRef<Path>>(script_folder: P) -> Result<Self, Error> {
        let data_folder = script_folder.as_ref().join(DATA_FOLDER);
        let descriptors = find_descriptor_files(&data_folder)?;

        let mut recording = Recording::default();
        for descriptor_path in descriptors {
            let descriptor = load_descriptor(&descriptor_path)?;
            let nodes = load_snapshot_document(&descriptor.snapshot_document)?;

            let requests = nodes.iter().map(|node| node.request.clone()).collect();
            let responses = nodes
                .into_iter()
                .map(|node| build_response(&descriptor, node))
                .collect();

            recording.append(&descriptor_path, requests, responses)?;
            debug!(
                "loaded {} ({} transactions so far)",
                descriptor_path.display(),
                recording.len()
            );
        }

        Ok(recording)
    }

    fn append(
        &mut self,
        descriptor_path: &Path,
        requests: Vec<RequestRecord>,
        responses: Vec<ResponseRecord>,
    ) -> Result<(), Error> {
        self.requests.extend(requests);
        self.responses.extend(responses);

        if self.requests.len() != self.responses.len() {
            return Err(Error::RequestResponseCountMismatch {
                path: descriptor_path.to_path_buf(),
                requests: self.requests.len(),
                responses: self.responses.len(),
            });
        }

        Ok(())
    }

    pub fn requests(&self) -> &[RequestRecord] {
        &self.requests
    }

    pub fn responses(&self) -> &[ResponseRecord] {
        &self.responses
    }

    pub fn transactions(&self) -> impl Iterator<Item = (&RequestRecord, &ResponseRecord)> {
        self.requests.iter().zip(self.responses.iter())
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

fn find_descriptor_files(data_folder: &Path) -> Result<Vec<PathBuf>, Error> {
    if !data_folder.is_dir() {
        return Err(Error::NoSnapshotsFound(data_folder.to_path_buf()));
    }

    let mut descriptors = Vec::new();
    for entry in fs::read_dir(data_folder)? {
        let path = entry?.path();
        let is_descriptor = path
            .file_name()
            .map(|name| DESCRIPTOR_FILE_REGEX.is_match(&name.to_string_lossy()))
            .unwrap_or(false);

        if is_descriptor && path.is_file() {
            descriptors.push(path);
        }
    }

    if descriptors.is_empty() {
        return Err(Error::NoSnapshotsFound(data_folder.to_path_buf()));
    }

    descriptors.sort();
    Ok(descriptors)
}

/// Only 200 responses have a saved payload, anything else replays with an empty body.
fn build_response(descriptor: &Descriptor, node: SnapshotNode) -> ResponseRecord {
    let payload_path = if node.response.status_code == 200 {
        descriptor.payload_path(&node.url)
    } else {
        None
    };

    ResponseRecord {
        url: node.url,
        status_code: node.response.status_code,
        headers: node.response.headers,
        cookies: node.response.cookies,
        payload_path,
    }
}
