use opentelemetry::otel_debug;
use std::collections::BTreeMap;

/// Custom properties attached to a telemetry item.
pub type Properties = BTreeMap<String, String>;

pub(crate) const MAX_NAME_LENGTH: usize = 1024;
pub(crate) const MAX_MESSAGE_LENGTH: usize = 32768;
pub(crate) const MAX_COMMAND_NAME_LENGTH: usize = 8192;
pub(crate) const MAX_DEPENDENCY_TYPE_LENGTH: usize = 1024;
pub(crate) const MAX_URL_LENGTH: usize = 2048;
pub(crate) const MAX_ID_LENGTH: usize = 128;
pub(crate) const MAX_RESULT_CODE_LENGTH: usize = 1024;
pub(crate) const MAX_PROPERTY_KEY_LENGTH: usize = 150;
pub(crate) const MAX_PROPERTY_VALUE_LENGTH: usize = 8192;

/// Suffix width used to make colliding truncated property keys unique.
const UNIQUE_SUFFIX_WIDTH: usize = 3;

/// Truncates fields to the lengths accepted by the ingestion endpoint.
pub trait Sanitize {
    /// Truncate all fields in place.
    fn sanitize(&mut self);
}

/// Truncates `value` to at most `max` characters without splitting a code point.
pub(crate) fn truncate(value: &mut String, max: usize) {
    if let Some((index, _)) = value.char_indices().nth(max) {
        value.truncate(index);
    }
}

pub(crate) fn truncate_opt(value: &mut Option<String>, max: usize) {
    if let Some(value) = value.as_mut() {
        truncate(value, max);
    }
}

impl Sanitize for Properties {
    fn sanitize(&mut self) {
        let long_keys: Vec<_> = self
            .keys()
            .filter(|k| k.chars().count() > MAX_PROPERTY_KEY_LENGTH)
            .cloned()
            .collect();
        for long_key in long_keys {
            let (mut key, value) = self
                .remove_entry(&long_key)
                .expect("value needs to exist. got key by iterating over map");
            truncate(&mut key, MAX_PROPERTY_KEY_LENGTH);
            if self.contains_key(&key) {
                let unique = make_key_unique(self, &key);
                otel_debug!(
                    name: "Sanitize.PropertyKeyCollision",
                    truncated_key = key.as_str(),
                    unique_key = unique.as_str()
                );
                key = unique;
            }
            self.insert(key, value);
        }
        for value in self.values_mut() {
            truncate(value, MAX_PROPERTY_VALUE_LENGTH);
        }
    }
}

fn make_key_unique(properties: &Properties, key: &str) -> String {
    let prefix: String = key
        .chars()
        .take(MAX_PROPERTY_KEY_LENGTH - UNIQUE_SUFFIX_WIDTH)
        .collect();
    let mut candidate = String::new();
    for counter in 1..1000 {
        candidate = format!("{}{:03}", prefix, counter);
        if !properties.contains_key(&candidate) {
            break;
        }
    }
    candidate
}
