//! Dispatch boundary: fire-and-forget delivery of serialized payloads.

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use beacon_logging::{beacon_debug, beacon_error, beacon_warn};
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconRequest {
    pub endpoint: Url,
    /// JSON text, posted as `text/plain`.
    pub body: String,
}

/// Response status reported to the caller's callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStatus {
    pub status: u16,
}

pub type DeliveryCallback = Box<dyn FnOnce(Option<DeliveryStatus>) + Send + 'static>;

#[derive(Debug, Error)]
pub enum TransportError {
    /// No delivery mechanism in this host; the send is skipped.
    #[error("transport unavailable")]
    Unavailable,
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
}

pub trait Transport: Send + Sync {
    /// Starts delivery without waiting for it. Failures after this returns
    /// are logged and dropped; nothing is retried.
    fn send(
        &self,
        request: BeaconRequest,
        done: Option<DeliveryCallback>,
    ) -> Result<(), TransportError>;
}

#[async_trait::async_trait]
pub trait Poster: Send + Sync {
    async fn post(&self, request: &BeaconRequest) -> Result<DeliveryStatus, TransportError>;
}

#[derive(Debug, Clone)]
pub struct PostSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestPoster {
    client: reqwest::Client,
}

impl ReqwestPoster {
    pub fn new(settings: PostSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Poster for ReqwestPoster {
    async fn post(&self, request: &BeaconRequest) -> Result<DeliveryStatus, TransportError> {
        let response = self
            .client
            .post(request.endpoint.clone())
            .header(CONTENT_TYPE, "text/plain")
            .body(request.body.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        // Any answer from the collector completes the delivery.
        Ok(DeliveryStatus {
            status: response.status().as_u16(),
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(err.to_string());
    }
    TransportError::Network(err.to_string())
}

struct Delivery {
    request: BeaconRequest,
    done: Option<DeliveryCallback>,
}

/// Delivers on a background worker hosting a tokio runtime.
pub struct QueuedTransport {
    tx: mpsc::Sender<Delivery>,
}

impl QueuedTransport {
    pub fn new(poster: Arc<dyn Poster>) -> Self {
        let (tx, rx) = mpsc::channel::<Delivery>();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    // Dropping `rx` makes every later send report Unavailable.
                    beacon_error!("Failed to start delivery runtime: {}", err);
                    return;
                }
            };
            while let Ok(delivery) = rx.recv() {
                let poster = poster.clone();
                runtime.spawn(async move {
                    deliver(poster.as_ref(), delivery).await;
                });
            }
        });

        Self { tx }
    }

    pub fn with_reqwest(settings: PostSettings) -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(ReqwestPoster::new(settings)?)))
    }
}

impl Transport for QueuedTransport {
    fn send(
        &self,
        request: BeaconRequest,
        done: Option<DeliveryCallback>,
    ) -> Result<(), TransportError> {
        self.tx
            .send(Delivery { request, done })
            .map_err(|_| TransportError::Unavailable)
    }
}

async fn deliver(poster: &dyn Poster, delivery: Delivery) {
    let Delivery { request, done } = delivery;
    match poster.post(&request).await {
        Ok(status) => {
            beacon_debug!("delivered to {} status={}", request.endpoint, status.status);
            if let Some(done) = done {
                done(Some(status));
            }
        }
        Err(err) => {
            beacon_warn!("Delivery to {} failed: {}", request.endpoint, err);
        }
    }
}
