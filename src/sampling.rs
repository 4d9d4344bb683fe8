use crate::{context_tag_keys::OPERATION_ID, telemetry::TelemetryItem};

/// Whether `item` survives sampling.
///
/// Items without a sampling percentage, or with one of at least 100, are always kept. All items
/// sharing an operation id get the same decision.
pub(crate) fn is_sampled_in(item: &TelemetryItem) -> bool {
    let percentage = match item.as_sampled().and_then(|s| s.sampling_percentage()) {
        Some(percentage) if percentage < 100.0 => percentage,
        _ => return true,
    };
    sampling_score(item) < percentage
}

/// Score in `[0, 100]`.
fn sampling_score(item: &TelemetryItem) -> f64 {
    match item.context().tag(OPERATION_ID).filter(|id| !id.is_empty()) {
        Some(operation_id) => hash_score(operation_id),
        None => rand::random::<f64>() * 100.0,
    }
}

fn hash_score(input: &str) -> f64 {
    let mut units: Vec<u16> = input.encode_utf16().collect();
    let original = units.len();
    if original == 0 {
        return 0.0;
    }
    while units.len() < 8 {
        units.extend_from_within(..original);
    }

    let mut hash: i32 = 5381;
    for unit in units {
        hash = (hash << 5).wrapping_add(hash).wrapping_add(i32::from(unit));
    }
    let hash = if hash == i32::MIN { i32::MAX } else { hash.abs() };
    f64::from(hash) / f64::from(i32::MAX) * 100.0
}
