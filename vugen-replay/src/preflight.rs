use crate::{error::Error, recording::Recording};
use async_trait::async_trait;
use futures::future::join_all;
use std::{
    fmt::Debug,
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};
use tokio::{net::TcpStream, time::timeout};

const PORT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// An environment check run against a freshly loaded recording before it is replayed.
#[async_trait]
pub trait PreflightCheck: Debug {
    async fn check(&self, recording: &Recording) -> Result<(), Error>;
}

/// Every recorded host name must resolve to 127.0.0.1, i.e. be listed in the hosts file.
#[derive(Debug, Clone, Default)]
pub struct HostsResolveLocally;

#[async_trait]
impl PreflightCheck for HostsResolveLocally {
    async fn check(&self, recording: &Recording) -> Result<(), Error> {
        let hosts = recording.distinct_hosts();
        let resolved = join_all(hosts.iter().map(|host| resolves_locally(host))).await;

        let not_local: Vec<String> = hosts
            .into_iter()
            .zip(resolved)
            .filter(|(_, local)| !local)
            .map(|(host, _)| host)
            .collect();

        if not_local.is_empty() {
            Ok(())
        } else {
            Err(Error::HostsNotLocal(not_local))
        }
    }
}

async fn resolves_locally(host: &str) -> bool {
    match tokio::net::lookup_host((host, 0)).await {
        Ok(mut addresses) => {
            addresses.any(|address| address.ip() == IpAddr::V4(Ipv4Addr::LOCALHOST))
        }
        Err(_) => false,
    }
}

/// Every recorded port must accept connections on localhost. This only proves the port is open,
/// not that the replay server is the one listening.
#[derive(Debug, Clone, Default)]
pub struct PortsListening;

#[async_trait]
impl PreflightCheck for PortsListening {
    async fn check(&self, recording: &Recording) -> Result<(), Error> {
        let ports = recording.distinct_ports();
        let listening = join_all(ports.iter().map(|port| is_listening(*port))).await;

        let closed: Vec<u16> = ports
            .into_iter()
            .zip(listening)
            .filter(|(_, open)| !open)
            .map(|(port, _)| port)
            .collect();

        if closed.is_empty() {
            Ok(())
        } else {
            Err(Error::PortsNotListening(closed))
        }
    }
}

async fn is_listening(port: u16) -> bool {
    matches!(
        timeout(PORT_PROBE_TIMEOUT, TcpStream::connect(("localhost", port))).await,
        Ok(Ok(_))
    )
}
