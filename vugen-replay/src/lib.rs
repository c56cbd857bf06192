mod correlator;
mod data;
mod descriptor;
mod dispatcher;
mod error;
mod error_page;
mod mime;
mod preflight;
mod recording;
mod recording_source;
mod replay_configuration;
mod runner;
mod snapshot;
mod util;

#[cfg(test)]
mod test_support;

pub use data::{
    FieldDifference, NearMiss, RecognizedHeader, RequestRecord, ResponseRecord, SkippedHeader,
    SET_COOKIE,
};
pub use descriptor::{
    load_descriptor, parse_descriptor, Descriptor, DescriptorIndex, DescriptorResource,
};
pub use dispatcher::dispatch;
pub use error::Error;
pub use error_page::{render as render_error_page, render_html as render_error_html};
pub use mime::MimeTable;
pub use preflight::{HostsResolveLocally, PortsListening, PreflightCheck};
pub use recording::Recording;
pub use recording_source::{RecordingSource, ScriptDirectory, VuGenFolder};
pub use replay_configuration::ReplayConfiguration;
pub use runner::{bind, serve, BoundServer};
pub use snapshot::{
    load_snapshot_document, parse_snapshot_document, parse_status_code, SnapshotNode,
    SnapshotResponse,
};
pub use util::live_request;
