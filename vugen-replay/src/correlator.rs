use crate::{
    data::{NearMiss, RequestRecord, ResponseRecord},
    error::Error,
    recording::Recording,
};
use hyper::Uri;
use log::warn;

impl Recording {
    /// Response recorded for the first request exactly equal to `request`.
    ///
    /// URL, method, recognized headers and body must all match. There is no support for dynamic
    /// values, a request carrying a fresh session id never matches.
    pub fn lookup(&self, request: &RequestRecord) -> Result<&ResponseRecord, Error> {
        self.requests()
            .iter()
            .position(|recorded| recorded == request)
            .map(|index| &self.responses()[index])
            .ok_or_else(|| Error::NoMatchingResponse {
                url: request.url.clone(),
                known_urls: self.recorded_urls(),
                near_misses: self.near_misses(request),
            })
    }

    /// Recorded requests for the same URL as `request`, with the fields that kept them apart.
    pub fn near_misses(&self, request: &RequestRecord) -> Vec<NearMiss> {
        self.requests()
            .iter()
            .enumerate()
            .filter(|(_, recorded)| recorded.url == request.url)
            .map(|(index, recorded)| NearMiss {
                position: index + 1,
                differences: recorded.differences(request),
            })
            .collect()
    }

    /// Every recorded request URL, in recording order.
    pub fn recorded_urls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }

    /// Host names of all recorded URLs, in first-seen order.
    pub fn distinct_hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = Vec::new();

        for uri in self.recorded_uris() {
            if let Some(host) = uri.host() {
                if !hosts.iter().any(|known| known == host) {
                    hosts.push(host.to_string());
                }
            }
        }

        hosts
    }

    /// Ports of all recorded URLs, in first-seen order. URLs without an explicit port use 80 for
    /// `http` and 443 for `https`.
    pub fn distinct_ports(&self) -> Vec<u16> {
        let mut ports = Vec::new();

        for uri in self.recorded_uris() {
            let port = uri.port_u16().or_else(|| match uri.scheme_str() {
                Some("http") => Some(80),
                Some("https") => Some(443),
                _ => None,
            });

            if let Some(port) = port {
                if !ports.contains(&port) {
                    ports.push(port);
                }
            }
        }

        ports
    }

    fn recorded_uris(&self) -> impl Iterator<Item = Uri> + '_ {
        self.requests()
            .iter()
            .filter_map(|request| match request.url.parse::<Uri>() {
                Ok(uri) => Some(uri),
                Err(e) => {
                    warn!("skipping unparsable recorded URL {}: {}", request.url, e);
                    None
                }
            })
    }
}
