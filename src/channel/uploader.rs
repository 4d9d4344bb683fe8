use crate::{models::Envelope, Error};
use backon::{ExponentialBuilder, FuturesTimerSleeper, Retryable};
use bytes::Bytes;
use flate2::{write::GzEncoder, Compression};
use http::{Request, Response, Uri};
use opentelemetry::otel_debug;
use opentelemetry_http::HttpClient;
use serde::Deserialize;
use std::{io::Write, time::Duration};

const STATUS_OK: u16 = 200;
const STATUS_PARTIAL_CONTENT: u16 = 206;
const STATUS_REQUEST_TIMEOUT: u16 = 408;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;
const STATUS_APPLICATION_INACTIVE: u16 = 439; // Quota
const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;
const STATUS_SERVICE_UNAVAILABLE: u16 = 503;

const MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Transmission {
    items_received: usize,
    items_accepted: usize,
    errors: Vec<TransmissionItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransmissionItem {
    status_code: u16,
}

#[derive(Debug)]
enum Attempt {
    Retry(Error),
    Fail(Error),
}

impl Attempt {
    fn into_error(self) -> Error {
        match self {
            Attempt::Retry(err) | Attempt::Fail(err) => err,
        }
    }
}

/// Sends telemetry items to the server, retrying transient failures with exponential backoff.
pub(crate) async fn send<C: HttpClient + ?Sized>(
    client: &C,
    endpoint: &Uri,
    items: &[Envelope],
) -> Result<(), Error> {
    if items.is_empty() {
        return Ok(());
    }
    let payload = Bytes::from(serialize_request_body(items)?);

    (|| async { send_once(client, endpoint, payload.clone()).await })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(500))
                .with_max_times(MAX_ATTEMPTS),
        )
        .sleep(FuturesTimerSleeper)
        .when(|attempt| matches!(attempt, Attempt::Retry(_)))
        .notify(|attempt, delay| {
            otel_debug!(
                name: "InMemoryChannel.RetryUpload",
                error = format!("{:?}", attempt),
                delay_ms = delay.as_millis() as u64
            );
        })
        .await
        .map_err(Attempt::into_error)
}

async fn send_once<C: HttpClient + ?Sized>(
    client: &C,
    endpoint: &Uri,
    payload: Bytes,
) -> Result<(), Attempt> {
    let request = Request::post(endpoint)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::CONTENT_ENCODING, "gzip")
        .body(payload)
        .expect("request should be valid");

    let response = client
        .send_bytes(request)
        .await
        .map_err(|err| Attempt::Retry(Error::UploadConnection(err)))?;
    handle_response(response)
}

fn serialize_request_body(items: &[Envelope]) -> Result<Vec<u8>, Error> {
    let serialized = serde_json::to_vec(items).map_err(Error::UploadSerializeRequest)?;
    let mut gzip_encoder = GzEncoder::new(Vec::new(), Compression::default());
    gzip_encoder
        .write_all(&serialized)
        .map_err(Error::UploadCompressRequest)?;
    gzip_encoder.finish().map_err(Error::UploadCompressRequest)
}

fn handle_response(response: Response<Bytes>) -> Result<(), Attempt> {
    match response.status().as_u16() {
        STATUS_OK => Ok(()),
        status @ STATUS_PARTIAL_CONTENT => {
            let content: Transmission = serde_json::from_slice(response.body())
                .map_err(|err| Attempt::Fail(Error::UploadDeserializeResponse(err)))?;
            if content.items_received == content.items_accepted {
                Ok(())
            } else if content.errors.iter().any(can_retry_item) {
                Err(Attempt::Retry(Error::Upload(format!(
                    "{}: Some items may be retried",
                    status
                ))))
            } else {
                Err(Attempt::Fail(Error::Upload(format!(
                    "{}: No retry possible. Response: {:?}",
                    status, content
                ))))
            }
        }
        status @ STATUS_REQUEST_TIMEOUT
        | status @ STATUS_TOO_MANY_REQUESTS
        | status @ STATUS_APPLICATION_INACTIVE
        | status @ STATUS_SERVICE_UNAVAILABLE => Err(Attempt::Retry(Error::Upload(format!(
            "{}: Retry possible",
            status
        )))),
        status @ STATUS_INTERNAL_SERVER_ERROR => {
            if let Ok(content) = serde_json::from_slice::<Transmission>(response.body()) {
                if content.errors.iter().any(can_retry_item) {
                    Err(Attempt::Retry(Error::Upload(format!(
                        "{}: Some items may be retried",
                        status
                    ))))
                } else {
                    Err(Attempt::Fail(Error::Upload(format!(
                        "{}: No retry possible",
                        status
                    ))))
                }
            } else {
                Err(Attempt::Retry(Error::Upload(format!(
                    "{}: Some items may be retried",
                    status
                ))))
            }
        }
        status => Err(Attempt::Fail(Error::Upload(format!(
            "{}: No retry possible {}",
            status,
            String::from_utf8_lossy(response.body())
        )))),
    }
}

/// Determines that a telemetry item can be re-send corresponding to this submission status
/// descriptor.
fn can_retry_item(item: &TransmissionItem) -> bool {
    item.status_code == STATUS_PARTIAL_CONTENT
        || item.status_code == STATUS_REQUEST_TIMEOUT
        || item.status_code == STATUS_TOO_MANY_REQUESTS
        || item.status_code == STATUS_APPLICATION_INACTIVE
        || item.status_code == STATUS_INTERNAL_SERVER_ERROR
        || item.status_code == STATUS_SERVICE_UNAVAILABLE
}
