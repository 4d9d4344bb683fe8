//! Well-known context tag keys.
//!
//! Tags are stored on a [`TelemetryContext`](crate::TelemetryContext) as plain strings so custom
//! keys stay possible. These constants name the keys the ingestion endpoint understands.

use crate::models::sanitize::truncate;
use std::collections::BTreeMap;
use std::fmt;

/// Context tags of a telemetry item.
pub type Tags = BTreeMap<String, String>;

/// Key of a context tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextTagKey(&'static str);

impl ContextTagKey {
    const fn new(key: &'static str) -> Self {
        ContextTagKey(key)
    }

    /// The tag key as sent on the wire.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ContextTagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl From<ContextTagKey> for String {
    fn from(key: ContextTagKey) -> Self {
        key.0.to_string()
    }
}

/// Application version. Information in the application context fields is always about the
/// application that is sending the telemetry.
pub const APPLICATION_VERSION: ContextTagKey = ContextTagKey::new("ai.application.ver");

/// Unique client device id. Computer name in most cases.
pub const DEVICE_ID: ContextTagKey = ContextTagKey::new("ai.device.id");

/// Device locale using <language>-<REGION> pattern, following RFC 5646. Example 'en-US'.
pub const DEVICE_LOCALE: ContextTagKey = ContextTagKey::new("ai.device.locale");

/// Model of the device the end user of the application is using. Used for client scenarios. If
/// this field is empty then it is derived from the user agent.
pub const DEVICE_MODEL: ContextTagKey = ContextTagKey::new("ai.device.model");

/// Client device OEM name taken from the browser.
pub const DEVICE_OEM_NAME: ContextTagKey = ContextTagKey::new("ai.device.oemName");

/// Operating system name and version of the device the end user of the application is using. If
/// this field is empty then it is derived from the user agent. Example 'Windows 10 Pro
/// 10.0.10586.0'
pub const DEVICE_OS_VERSION: ContextTagKey = ContextTagKey::new("ai.device.osVersion");

/// The type of the device the end user of the application is using. Used primarily to distinguish
/// JavaScript telemetry from server side telemetry. Examples: 'PC', 'Phone', 'Browser'. 'PC' is
/// the default value.
pub const DEVICE_TYPE: ContextTagKey = ContextTagKey::new("ai.device.type");

/// The IP address of the client device. IPv4 and IPv6 are supported. Information in the location
/// context fields is always about the end user. When telemetry is sent from a service, the
/// location context is about the user that initiated the operation in the service.
pub const LOCATION_IP: ContextTagKey = ContextTagKey::new("ai.location.ip");

/// The country of the client device. If any of Country, Province, or City is specified, those
/// values will be preferred over geolocation of the IP address field. Information in the location
/// context fields is always about the end user. When telemetry is sent from a service, the
/// location context is about the user that initiated the operation in the service.
pub const LOCATION_COUNTRY: ContextTagKey = ContextTagKey::new("ai.location.country");

/// The province/state of the client device. If any of Country, Province, or City is specified,
/// those values will be preferred over geolocation of the IP address field. Information in the
/// location context fields is always about the end user. When telemetry is sent from a service,
/// the location context is about the user that initiated the operation in the service.
pub const LOCATION_PROVINCE: ContextTagKey = ContextTagKey::new("ai.location.province");

/// The city of the client device. If any of Country, Province, or City is specified, those values
/// will be preferred over geolocation of the IP address field. Information in the location context
/// fields is always about the end user. When telemetry is sent from a service, the location
/// context is about the user that initiated the operation in the service.
pub const LOCATION_CITY: ContextTagKey = ContextTagKey::new("ai.location.city");

/// A unique identifier for the operation instance. The operation.id is created by either a request
/// or a page view. All other telemetry sets this to the value for the containing request or page
/// view. Operation.id is used for finding all the telemetry items for a specific operation
/// instance.
pub const OPERATION_ID: ContextTagKey = ContextTagKey::new("ai.operation.id");

/// The name (group) of the operation. The operation.name is created by either a request or a page
/// view. All other telemetry items set this to the value for the containing request or page view.
/// Operation.name is used for finding all the telemetry items for a group of operations (i.e. 'GET
/// Home/Index').
pub const OPERATION_NAME: ContextTagKey = ContextTagKey::new("ai.operation.name");

/// The unique identifier of the telemetry item's immediate parent.
pub const OPERATION_PARENT_ID: ContextTagKey = ContextTagKey::new("ai.operation.parentId");

/// Name of synthetic source. Some telemetry from the application may represent a synthetic
/// traffic. It may be web crawler indexing the web site, site availability tests or traces from
/// diagnostic libraries like Application Insights SDK itself.
pub const OPERATION_SYNTHETIC_SOURCE: ContextTagKey =
    ContextTagKey::new("ai.operation.syntheticSource");

/// The correlation vector is a light weight vector clock which can be used to identify and order
/// related events across clients and services.
pub const OPERATION_CORRELATION_VECTOR: ContextTagKey =
    ContextTagKey::new("ai.operation.correlationVector");

/// Session ID - the instance of the user's interaction with the app. Information in the session
/// context fields is always about the end user. When telemetry is sent from a service, the session
/// context is about the user that initiated the operation in the service.
pub const SESSION_ID: ContextTagKey = ContextTagKey::new("ai.session.id");

/// Boolean value indicating whether the session identified by ai.session.id is first for the user
/// or not.
pub const SESSION_IS_FIRST: ContextTagKey = ContextTagKey::new("ai.session.isFirst");

/// In multi-tenant applications this is the account ID or name which the user is acting with.
/// Examples may be subscription ID for Azure portal or blog name blogging platform.
pub const USER_ACCOUNT_ID: ContextTagKey = ContextTagKey::new("ai.user.accountId");

/// Anonymous user id. Represents the end user of the application. When telemetry is sent from a
/// service, the user context is about the user that initiated the operation in the service.
pub const USER_ID: ContextTagKey = ContextTagKey::new("ai.user.id");

/// Authenticated user id. The opposite of ai.user.id, this represents the user with a friendly
/// name. Since it's PII information it is not collected by default by most SDKs.
pub const USER_AUTH_USER_ID: ContextTagKey = ContextTagKey::new("ai.user.authUserId");

/// Name of the role the application is a part of. Maps directly to the role name in azure.
pub const CLOUD_ROLE: ContextTagKey = ContextTagKey::new("ai.cloud.role");

/// Name of the instance where the application is running. Computer name for on-premisis, instance
/// name for Azure.
pub const CLOUD_ROLE_INSTANCE: ContextTagKey = ContextTagKey::new("ai.cloud.roleInstance");

/// SDK version. See
/// https://github.com/Microsoft/ApplicationInsights-Home/blob/master/SDK-AUTHORING.md#sdk-version-specification
/// for information.
pub const INTERNAL_SDK_VERSION: ContextTagKey = ContextTagKey::new("ai.internal.sdkVersion");

/// Agent version. Used to indicate the version of StatusMonitor installed on the computer if it is
/// used for data collection.
pub const INTERNAL_AGENT_VERSION: ContextTagKey =
    ContextTagKey::new("ai.internal.agentVersion");

/// This is the node name used for billing purposes. Use it to override the standard detection of
/// nodes.
pub const INTERNAL_NODE_NAME: ContextTagKey = ContextTagKey::new("ai.internal.nodeName");

/// Maximum value length for a tag. Unknown tags use the generic property value limit.
pub(crate) fn max_length(key: &str) -> usize {
    const LIMITS: [(ContextTagKey, usize); 26] = [
        (APPLICATION_VERSION, 1024),
        (DEVICE_ID, 1024),
        (DEVICE_LOCALE, 64),
        (DEVICE_MODEL, 256),
        (DEVICE_OEM_NAME, 256),
        (DEVICE_OS_VERSION, 256),
        (DEVICE_TYPE, 64),
        (LOCATION_IP, 46),
        (LOCATION_COUNTRY, 256),
        (LOCATION_PROVINCE, 256),
        (LOCATION_CITY, 256),
        (OPERATION_ID, 128),
        (OPERATION_NAME, 1024),
        (OPERATION_PARENT_ID, 128),
        (OPERATION_SYNTHETIC_SOURCE, 1024),
        (OPERATION_CORRELATION_VECTOR, 64),
        (SESSION_ID, 64),
        (SESSION_IS_FIRST, 5),
        (USER_ACCOUNT_ID, 1024),
        (USER_ID, 128),
        (USER_AUTH_USER_ID, 1024),
        (CLOUD_ROLE, 256),
        (CLOUD_ROLE_INSTANCE, 256),
        (INTERNAL_SDK_VERSION, 64),
        (INTERNAL_AGENT_VERSION, 64),
        (INTERNAL_NODE_NAME, 256),
    ];
    LIMITS
        .iter()
        .find(|(known, _)| known.as_str() == key)
        .map(|(_, max)| *max)
        .unwrap_or(crate::models::sanitize::MAX_PROPERTY_VALUE_LENGTH)
}

/// Truncates every tag value to the limit of its key.
pub(crate) fn sanitize_tags(tags: &mut Tags) {
    for (key, value) in tags.iter_mut() {
        truncate(value, max_length(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(OPERATION_ID.as_str(), 128 ; "operation id")]
    #[test_case(SESSION_IS_FIRST.as_str(), 5 ; "session is first")]
    #[test_case("my.custom.tag", 8192 ; "unknown tag")]
    fn tag_limits(key: &str, expected: usize) {
        assert_eq!(expected, max_length(key));
    }

    #[test]
    fn sanitize_truncates_known_tags() {
        let mut tags = Tags::new();
        tags.insert(OPERATION_ID.into(), "1".repeat(200));
        tags.insert(SESSION_ID.into(), "s".repeat(10));
        sanitize_tags(&mut tags);
        assert_eq!(128, tags[OPERATION_ID.as_str()].len());
        assert_eq!(10, tags[SESSION_ID.as_str()].len());
    }
}
