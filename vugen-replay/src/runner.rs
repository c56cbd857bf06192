use crate::{
    data::RequestRecord, dispatcher, error::Error, error_page, recording::Recording,
    replay_configuration::ReplayConfiguration, util,
};
use futures::future::try_join_all;
use hyper::{
    body,
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server,
};
use log::{error, info, warn};
use std::{convert::Infallible, future::Future, io, net::SocketAddr, pin::Pin, sync::Arc};
use tokio::task;

type ServerFuture = Pin<Box<dyn Future<Output = Result<(), hyper::Error>> + Send>>;

/// Servers bound to every configured address, not yet accepting connections.
pub struct BoundServer {
    local_addrs: Vec<SocketAddr>,
    servers: Vec<ServerFuture>,
}

impl BoundServer {
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    pub async fn run(self) -> Result<(), Error> {
        try_join_all(self.servers).await?;
        Ok(())
    }
}

/// Binds every listen address. Must be called from within a tokio runtime.
pub fn bind(configuration: ReplayConfiguration) -> Result<BoundServer, Error> {
    let configuration = Arc::new(configuration);
    let mut local_addrs = Vec::new();
    let mut servers: Vec<ServerFuture> = Vec::new();

    for addr in configuration.listen_addresses() {
        let configuration = configuration.clone();
        let server = Server::try_bind(&addr)?.serve(make_service_fn(move |_| {
            let configuration = configuration.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    handle_request(configuration.clone(), req)
                }))
            }
        }));

        info!("replaying on http://{}", server.local_addr());
        local_addrs.push(server.local_addr());
        servers.push(Box::pin(server));
    }

    Ok(BoundServer {
        local_addrs,
        servers,
    })
}

pub async fn serve(configuration: ReplayConfiguration) -> Result<(), Error> {
    bind(configuration)?.run().await
}

async fn handle_request(
    configuration: Arc<ReplayConfiguration>,
    request: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    match replay(&configuration, request).await {
        Ok(response) => {
            info!("{} {} -> {}", method, uri, response.status());
            Ok(response)
        }
        Err(e) => {
            if e.status_code() == 404 {
                warn!("{} {} -> {}", method, uri, e);
            } else {
                error!("{} {} -> {}", method, uri, e);
            }
            Ok(error_page::render(&e))
        }
    }
}

async fn replay(
    configuration: &Arc<ReplayConfiguration>,
    request: Request<Body>,
) -> Result<Response<Body>, Error> {
    let (parts, request_body) = request.into_parts();
    let request_body = body::to_bytes(request_body)
        .await
        .map_err(|_| Error::InvalidBody)?;
    let live_request = util::live_request(&parts, request_body.to_vec(), configuration.scheme());

    let recording_source = configuration.recording_source();
    let recording = blocking(move || recording_source.load_recording()).await?;

    for check in configuration.preflight_checks() {
        check.check(&recording).await?;
    }

    let configuration = configuration.clone();
    blocking(move || respond(&configuration, &recording, &live_request)).await
}

fn respond(
    configuration: &ReplayConfiguration,
    recording: &Recording,
    live_request: &RequestRecord,
) -> Result<Response<Body>, Error> {
    let response = recording.lookup(live_request)?;
    dispatcher::dispatch(response, configuration.mime_table())
}

async fn blocking<T, F>(f: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f).await.map_err(io::Error::from)?
}
