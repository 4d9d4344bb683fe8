use super::{uploader, TelemetryChannel};
use crate::{models::Envelope, telemetry::TelemetryItem, Error};
use async_trait::async_trait;
use opentelemetry::{otel_debug, otel_warn};
use opentelemetry_http::HttpClient;
use std::{
    collections::VecDeque,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

const DEFAULT_MAX_CAPACITY: usize = 500;

/// Channel that buffers envelopes in memory and uploads them to Application Insights on
/// [`flush`](TelemetryChannel::flush).
///
/// When the buffer is full, the oldest item is dropped.
pub struct InMemoryChannel<C> {
    client: C,
    endpoint: http::Uri,
    buffer: Mutex<VecDeque<Envelope>>,
    max_capacity: usize,
    developer_mode: AtomicBool,
}

impl<C: fmt::Debug> fmt::Debug for InMemoryChannel<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryChannel")
            .field("client", &self.client)
            .field("endpoint", &self.endpoint)
            .field("buffered", &self.len())
            .field("max_capacity", &self.max_capacity)
            .field("developer_mode", &self.developer_mode.load(Ordering::Relaxed))
            .finish()
    }
}

impl<C> InMemoryChannel<C> {
    /// Create a channel posting to `endpoint`, usually `<ingestion endpoint>/v2/track`.
    pub fn new(client: C, endpoint: http::Uri) -> Self {
        InMemoryChannel {
            client,
            endpoint,
            buffer: Mutex::new(VecDeque::new()),
            max_capacity: DEFAULT_MAX_CAPACITY,
            developer_mode: AtomicBool::new(false),
        }
    }

    /// Maximum number of buffered items.
    ///
    /// Default: 500
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity.max(1);
        self
    }

    /// Enable or disable developer mode.
    pub fn set_developer_mode(&self, developer_mode: bool) {
        self.developer_mode.store(developer_mode, Ordering::Relaxed);
    }

    /// Endpoint items are posted to.
    pub fn endpoint(&self) -> &http::Uri {
        &self.endpoint
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    /// Whether no items are buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }

    fn buffer(&self) -> MutexGuard<'_, VecDeque<Envelope>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<C: HttpClient + 'static> TelemetryChannel for InMemoryChannel<C> {
    fn send(&self, item: TelemetryItem) {
        let envelope = Envelope::from(&item);
        let mut buffer = self.buffer();
        if buffer.len() >= self.max_capacity {
            buffer.pop_front();
            otel_warn!(
                name: "InMemoryChannel.BufferFull",
                max_capacity = self.max_capacity as u64
            );
        }
        buffer.push_back(envelope);
    }

    fn developer_mode(&self) -> bool {
        self.developer_mode.load(Ordering::Relaxed)
    }

    async fn flush(&self) -> Result<(), Error> {
        let items: Vec<Envelope> = self.buffer().drain(..).collect();
        if items.is_empty() {
            return Ok(());
        }
        otel_debug!(name: "InMemoryChannel.Flush", items = items.len() as u64);
        uploader::send(&self.client, &self.endpoint, &items)
            .await
            .map_err(|err| {
                otel_warn!(
                    name: "InMemoryChannel.UploadFailed",
                    error = format!("{}", err),
                    dropped_items = items.len() as u64
                );
                err
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::EventTelemetry;
    use bytes::Bytes;
    use flate2::read::GzDecoder;
    use http::{Request, Response};
    use opentelemetry_http::HttpError;
    use std::{
        collections::VecDeque as Queue,
        io::Read,
        sync::{Arc, Mutex as StdMutex},
    };

    #[derive(Debug, Default, Clone)]
    struct RecordingClient {
        requests: Arc<StdMutex<Vec<Request<Bytes>>>>,
        statuses: Arc<StdMutex<Queue<u16>>>,
    }

    #[async_trait]
    impl HttpClient for RecordingClient {
        async fn send_bytes(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            self.requests.lock().unwrap().push(request);
            let status = self.statuses.lock().unwrap().pop_front().unwrap_or(200);
            Ok(Response::builder().status(status).body(Bytes::new())?)
        }
    }

    fn body(request: &Request<Bytes>) -> serde_json::Value {
        let mut decoder = GzDecoder::new(request.body().as_ref());
        let mut json = String::new();
        decoder.read_to_string(&mut json).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    fn channel(client: RecordingClient) -> InMemoryChannel<RecordingClient> {
        InMemoryChannel::new(client, "https://ingest/v2/track".parse().unwrap())
    }

    #[test]
    fn drops_oldest_when_full() {
        let channel = channel(RecordingClient::default()).with_max_capacity(2);
        for name in ["a", "b", "c"] {
            channel.send(EventTelemetry::new(name).into());
        }
        assert_eq!(2, channel.len());
        assert_eq!(
            vec!["b", "c"],
            channel
                .buffer()
                .iter()
                .map(|e| match &e.data {
                    crate::models::Data::Event(event) => event.name.clone(),
                    _ => unreachable!(),
                })
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn flush_uploads_gzipped_json_array() {
        let client = RecordingClient::default();
        let channel = channel(client.clone());
        channel.send(EventTelemetry::new("a").into());
        channel.send(EventTelemetry::new("b").into());

        channel.flush().await.unwrap();

        assert!(channel.is_empty());
        let requests = client.requests.lock().unwrap();
        assert_eq!(1, requests.len());
        let request = &requests[0];
        assert_eq!("https://ingest/v2/track", request.uri().to_string());
        assert_eq!("gzip", request.headers()[http::header::CONTENT_ENCODING]);
        let body = body(request);
        assert_eq!(2, body.as_array().unwrap().len());
        assert_eq!("Microsoft.ApplicationInsights.Event", body[0]["name"]);
        assert_eq!("b", body[1]["data"]["baseData"]["name"]);
    }

    #[tokio::test]
    async fn flush_without_items_does_not_upload() {
        let client = RecordingClient::default();
        channel(client.clone()).flush().await.unwrap();
        assert!(client.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let client = RecordingClient::default();
        client.statuses.lock().unwrap().extend([503, 429]);
        let channel = channel(client.clone());
        channel.send(EventTelemetry::new("a").into());

        channel.flush().await.unwrap();

        assert_eq!(3, client.requests.lock().unwrap().len());
    }

    #[tokio::test]
    async fn does_not_retry_permanent_failures() {
        let client = RecordingClient::default();
        client.statuses.lock().unwrap().push_back(400);
        let channel = channel(client.clone());
        channel.send(EventTelemetry::new("a").into());

        let result = channel.flush().await;

        assert!(matches!(result, Err(Error::Upload(_))));
        assert_eq!(1, client.requests.lock().unwrap().len());
    }
}
