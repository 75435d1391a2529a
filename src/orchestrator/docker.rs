//! Docker Engine API client.
//!
//! # Responsibilities
//! - Reach the engine over its unix socket or over TCP
//! - Ping the engine before the sync loops start and adopt its API version
//! - Open the `/events` subscription with a JSON filter
//! - Split the chunked body into newline-delimited event documents
//!
//! # Design Decisions
//! - TCP endpoints use reqwest; unix sockets use a hyper HTTP/1 connection
//!   per request, since the events stream holds its connection open anyway
//! - Both transports hand back the same status/header/body triple so ping
//!   and events share one code path

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use hyper::body::Bytes;
use serde::Deserialize;
#[cfg(unix)]
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::orchestrator::event::{EntityType, EventFilter, OrchestratorEvent};
use crate::orchestrator::{EventStream, Orchestrator};

const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Response header carrying the engine's API version.
const API_VERSION_HEADER: &str = "api-version";

type BodyStream = BoxStream<'static, Result<Bytes, OrchestratorError>>;

/// Status, negotiated version header and streaming body of one engine call.
struct EngineResponse {
    status: u16,
    api_version: Option<String>,
    body: BodyStream,
}

#[derive(Debug, Clone)]
enum Endpoint {
    Tcp {
        client: reqwest::Client,
        base_url: String,
    },
    #[cfg(unix)]
    Unix { socket: PathBuf },
}

/// Orchestrator backed by a Docker Engine.
#[derive(Debug, Clone)]
pub struct DockerClient {
    endpoint: Endpoint,
    api_version: Arc<ArcSwapOption<String>>,
}

impl DockerClient {
    /// Build a client for `unix://`, `tcp://`, `http://` or `https://` hosts.
    pub fn new(config: &OrchestratorConfig) -> Result<Self, OrchestratorError> {
        let host = match config.docker_host.strip_prefix("tcp://") {
            Some(rest) => format!("http://{}", rest),
            None => config.docker_host.clone(),
        };
        let url = url::Url::parse(&host)
            .map_err(|e| OrchestratorError::Endpoint(format!("{}: {}", config.docker_host, e)))?;

        let endpoint = match url.scheme() {
            #[cfg(unix)]
            "unix" => {
                if url.path().is_empty() {
                    return Err(OrchestratorError::Endpoint(format!(
                        "{}: missing socket path",
                        config.docker_host
                    )));
                }
                Endpoint::Unix {
                    socket: PathBuf::from(url.path()),
                }
            }
            "http" | "https" => {
                let client = reqwest::Client::builder()
                    .no_proxy()
                    .build()
                    .map_err(OrchestratorError::Request)?;
                Endpoint::Tcp {
                    client,
                    base_url: url.as_str().trim_end_matches('/').to_string(),
                }
            }
            other => {
                return Err(OrchestratorError::Endpoint(format!(
                    "{}: unsupported scheme '{}'",
                    config.docker_host, other
                )));
            }
        };

        let api_version = config
            .api_version
            .as_ref()
            .map(|v| Arc::new(v.trim_start_matches('v').to_string()));

        Ok(Self {
            endpoint,
            api_version: Arc::new(ArcSwapOption::new(api_version)),
        })
    }

    /// API version in use, configured or negotiated.
    pub fn api_version(&self) -> Option<String> {
        self.api_version.load_full().map(|v| v.as_ref().clone())
    }

    fn versioned_path(&self, path: &str) -> String {
        match self.api_version.load_full() {
            Some(version) => format!("/v{}{}", version, path),
            None => path.to_string(),
        }
    }

    async fn get(&self, path: &str) -> Result<EngineResponse, OrchestratorError> {
        match &self.endpoint {
            Endpoint::Tcp { client, base_url } => {
                let response = client.get(format!("{}{}", base_url, path)).send().await?;
                let status = response.status().as_u16();
                let api_version = response
                    .headers()
                    .get(API_VERSION_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let body = response
                    .bytes_stream()
                    .map(|chunk| chunk.map_err(OrchestratorError::from))
                    .boxed();
                Ok(EngineResponse {
                    status,
                    api_version,
                    body,
                })
            }
            #[cfg(unix)]
            Endpoint::Unix { socket } => unix_get(socket, path).await,
        }
    }
}

#[cfg(unix)]
async fn unix_get(socket: &Path, path: &str) -> Result<EngineResponse, OrchestratorError> {
    use http_body_util::{BodyExt, Empty};
    use hyper::{header, Method, Request};
    use hyper_util::rt::TokioIo;

    let stream = tokio::net::UnixStream::connect(socket).await?;
    let (mut sender, connection) =
        hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!(error = %e, "Docker socket connection closed");
        }
    });

    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .header(header::HOST, "docker")
        .body(Empty::<Bytes>::new())
        .map_err(|e| OrchestratorError::Endpoint(e.to_string()))?;
    let response = sender.send_request(request).await?;

    let status = response.status().as_u16();
    let api_version = response
        .headers()
        .get(API_VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    // The sender moves into the body stream so the connection outlives it.
    let body = response
        .into_body()
        .into_data_stream()
        .map(move |chunk| {
            let _ = &sender;
            chunk.map_err(OrchestratorError::from)
        })
        .boxed();

    Ok(EngineResponse {
        status,
        api_version,
        body,
    })
}

async fn read_body(mut body: BodyStream) -> String {
    let mut buffer = Vec::new();
    while let Some(Ok(chunk)) = body.next().await {
        buffer.extend_from_slice(&chunk);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[async_trait]
impl Orchestrator for DockerClient {
    async fn ping(&self) -> Result<(), OrchestratorError> {
        let response = tokio::time::timeout(PING_TIMEOUT, self.get("/_ping"))
            .await
            .map_err(|_| OrchestratorError::Timeout(PING_TIMEOUT))??;

        if response.status != 200 {
            return Err(OrchestratorError::Status {
                status: response.status,
                body: read_body(response.body).await,
            });
        }

        if self.api_version.load().is_none() {
            if let Some(version) = response.api_version {
                tracing::debug!(version = %version, "Negotiated orchestrator API version");
                self.api_version.store(Some(Arc::new(version)));
            }
        }
        Ok(())
    }

    fn events(&self, filter: &EventFilter) -> EventStream {
        let filters = match serde_json::to_string(filter) {
            Ok(filters) => filters,
            Err(e) => return stream::once(async move { Err(OrchestratorError::Decode(e)) }).boxed(),
        };
        let path = format!(
            "{}?filters={}",
            self.versioned_path("/events"),
            url::form_urlencoded::byte_serialize(filters.as_bytes()).collect::<String>()
        );
        let client = self.clone();

        let opened = async move {
            let response = client.get(&path).await?;
            if response.status != 200 {
                return Err(OrchestratorError::Status {
                    status: response.status,
                    body: read_body(response.body).await,
                });
            }
            Ok(response.body)
        };

        stream::once(opened)
            .flat_map(|opened| match opened {
                Ok(body) => decode_events(body).boxed(),
                Err(e) => stream::once(async move { Err(e) }).boxed(),
            })
            .boxed()
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "Type", default)]
    kind: String,
    #[serde(rename = "Action", default)]
    action: String,
    #[serde(rename = "Actor", default)]
    actor: RawActor,
}

#[derive(Debug, Default, Deserialize)]
struct RawActor {
    #[serde(rename = "ID", default)]
    id: Option<String>,
}

fn parse_event(line: &[u8]) -> Result<OrchestratorEvent, OrchestratorError> {
    let raw: RawEvent = serde_json::from_slice(line)?;
    Ok(OrchestratorEvent {
        entity: EntityType::from(raw.kind.as_str()),
        action: raw.action,
        actor_id: raw.actor.id.filter(|id| !id.is_empty()),
    })
}

fn trim_line(line: &[u8]) -> &[u8] {
    let start = line.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(line.len());
    let end = line.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |p| p + 1);
    &line[start..end.max(start)]
}

/// Decode a newline-delimited stream of JSON events.
///
/// A transport error is yielded once and ends the stream.
pub(crate) fn decode_events<S, B, E>(
    bytes: S,
) -> impl Stream<Item = Result<OrchestratorEvent, OrchestratorError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<OrchestratorError> + Send + 'static,
{
    stream::unfold(
        (Box::pin(bytes), Vec::<u8>::new(), false),
        |(mut bytes, mut buffer, done)| async move {
            if done {
                return None;
            }
            loop {
                if let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = trim_line(&line);
                    if line.is_empty() {
                        continue;
                    }
                    let event = parse_event(line);
                    return Some((event, (bytes, buffer, false)));
                }

                match bytes.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(chunk.as_ref()),
                    Some(Err(e)) => return Some((Err(e.into()), (bytes, buffer, true))),
                    None => {
                        let rest = trim_line(&buffer).to_vec();
                        if rest.is_empty() {
                            return None;
                        }
                        buffer.clear();
                        return Some((parse_event(&rest), (bytes, buffer, true)));
                    }
                }
            }
        },
    )
}
