use crate::{
    mime::MimeTable,
    preflight::{HostsResolveLocally, PortsListening, PreflightCheck},
    recording_source::RecordingSource,
};
use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};

const DEFAULT_SCHEME: &str = "http";
const DEFAULT_PORT: u16 = 80;

#[derive(Debug)]
pub struct ReplayConfiguration {
    recording_source: Arc<dyn RecordingSource + Send + Sync>,
    listen_addresses: Vec<SocketAddr>,
    scheme: String,
    mime_table: Option<MimeTable>,
    preflight_checks: Vec<Arc<dyn PreflightCheck + Send + Sync>>,
}

impl ReplayConfiguration {
    pub fn new(recording_source: Box<dyn RecordingSource + Send + Sync>) -> Self {
        Self {
            recording_source: recording_source.into(),
            listen_addresses: Vec::new(),
            scheme: String::from(DEFAULT_SCHEME),
            mime_table: None,
            preflight_checks: Vec::new(),
        }
    }

    pub fn recording_source(&self) -> Arc<dyn RecordingSource + Send + Sync> {
        self.recording_source.clone()
    }

    pub fn add_listen_address(&mut self, address: SocketAddr) {
        self.listen_addresses.push(address);
    }

    /// Configured addresses, or `127.0.0.1:80` when none were added.
    pub fn listen_addresses(&self) -> Vec<SocketAddr> {
        if self.listen_addresses.is_empty() {
            vec![SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT))]
        } else {
            self.listen_addresses.clone()
        }
    }

    pub fn set_scheme<S: Into<String>>(&mut self, scheme: S) {
        self.scheme = scheme.into();
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn set_mime_table(&mut self, mime_table: MimeTable) {
        self.mime_table = Some(mime_table);
    }

    pub fn mime_table(&self) -> Option<&MimeTable> {
        self.mime_table.as_ref()
    }

    pub fn add_preflight_check(&mut self, check: Arc<dyn PreflightCheck + Send + Sync>) {
        self.preflight_checks.push(check);
    }

    /// Adds the hosts file and listening ports checks.
    pub fn add_default_preflight_checks(&mut self) {
        self.add_preflight_check(Arc::new(HostsResolveLocally));
        self.add_preflight_check(Arc::new(PortsListening));
    }

    pub fn preflight_checks(&self) -> &[Arc<dyn PreflightCheck + Send + Sync>] {
        &self.preflight_checks
    }
}
