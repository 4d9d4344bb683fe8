use std::{borrow::Cow, collections::HashMap, convert::TryInto, str::FromStr};

pub(crate) const DEFAULT_BREEZE_ENDPOINT: &str = "https://dc.services.visualstudio.com";
const FIELDS_SEPARATOR: char = ';';
const FIELD_KEY_VALUE_SEPARATOR: char = '=';

/// Environment variable holding the connection string used by
/// [`TelemetryConfiguration::from_env`](crate::TelemetryConfiguration::from_env).
pub const CONNECTION_STRING_ENV: &str = "APPLICATIONINSIGHTS_CONNECTION_STRING";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ConnectionString {
    pub(crate) ingestion_endpoint: http::Uri,
    pub(crate) instrumentation_key: String,
}

impl ConnectionString {
    /// Endpoint telemetry envelopes are posted to.
    pub(crate) fn track_endpoint(&self) -> Result<http::Uri, ParseError> {
        let base = self.ingestion_endpoint.to_string();
        format!("{}/v2/track", base.trim_end_matches('/'))
            .parse()
            .map_err(ParseError::InvalidEndpoint)
    }
}

/// Reasons a connection string is rejected.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// A field is not in `key=value` form.
    #[error("invalid format")]
    InvalidFormat,
    /// The `InstrumentationKey` field is missing.
    #[error("missing instrumentation key")]
    MissingInstrumentationKey,
    /// `Authorization` is set to something other than `ikey`.
    #[error("unsupported authorization; only \"ikey\" is supported")]
    UnsupportedAuthorization,
    /// An endpoint is not a valid URI.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(http::uri::InvalidUri),
}

impl FromStr for ConnectionString {
    type Err = ParseError;

    /// Parse the given connection string.
    ///
    /// Based on
    /// https://github.com/Azure/azure-sdk-for-js/blob/a4b3762fd7503f90c7bc3bacf9e45ecc4012d3fa/sdk/monitor/monitor-opentelemetry-exporter/src/utils/connectionStringParser.ts
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut result: HashMap<String, String> = s
            .split(FIELDS_SEPARATOR)
            .map(|kv| {
                let parts: Vec<&str> = kv.split(FIELD_KEY_VALUE_SEPARATOR).collect();
                if parts.len() == 2 {
                    Ok((parts[0].to_lowercase(), parts[1].to_string()))
                } else {
                    Err(ParseError::InvalidFormat)
                }
            })
            .collect::<Result<_, _>>()?;

        let prefix_suffix = result.remove("endpointsuffix").map(|endpoint_suffix| {
            let location_prefix = result
                .remove("location")
                .map(|x| format!("{}.", x))
                .unwrap_or_else(|| "".into());
            (location_prefix, endpoint_suffix)
        });

        let ingestion_endpoint =
            if let Some(ingestion_endpoint) = result.remove("ingestionendpoint") {
                sanitize_url(ingestion_endpoint)?
            } else if let Some((location_prefix, endpoint_suffix)) = prefix_suffix.as_ref() {
                sanitize_url(format!("https://{}dc.{}", location_prefix, endpoint_suffix))?
            } else {
                http::Uri::from_static(DEFAULT_BREEZE_ENDPOINT)
            };

        if let Some(authorization) = result.remove("authorization") {
            if !authorization.eq_ignore_ascii_case("ikey") {
                return Err(ParseError::UnsupportedAuthorization);
            }
        }
        let instrumentation_key = result
            .remove("instrumentationkey")
            .ok_or(ParseError::MissingInstrumentationKey)?;

        Ok(ConnectionString {
            ingestion_endpoint,
            instrumentation_key,
        })
    }
}

fn sanitize_url(url: String) -> Result<http::Uri, ParseError> {
    let mut new_url: Cow<str> = url.trim().into();
    if !new_url.starts_with("https://") {
        new_url = new_url.replace("http://", "https://").into();
    }

    new_url
        .trim_end_matches('/')
        .try_into()
        .map_err(ParseError::InvalidEndpoint)
}
