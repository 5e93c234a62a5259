//! Payload comparison
//!
//! The source's search index intermittently changes array cardinality
//! (a one-element array comes back as a bare value, an empty array goes
//! missing) and injects an `attachment` marker on images. Neither is a
//! change to the entity, so both are stripped before comparing.
//! Every other difference counts as drift.

use serde_json::Value;

/// Field/value pair the source index adds to image-bearing entities
const ATTACHMENT_MARKER: &str = r#""attachment":"picture""#;

/// Renders a payload into the form used for equality checks
///
/// The payload is serialized with object keys in sorted order, every array
/// bracket is removed and the attachment marker is dropped together with
/// its separating comma.
pub fn prepare_for_comparison(payload: &Value) -> String {
    let canonical = payload.to_string();
    let flattened: String = canonical.chars().filter(|c| *c != '[' && *c != ']').collect();

    flattened
        .replace(&format!(",{ATTACHMENT_MARKER}"), "")
        .replace(&format!("{ATTACHMENT_MARKER},"), "")
        .replace(ATTACHMENT_MARKER, "")
}

/// Returns true when two payloads carry the same entity data
pub fn payloads_equal(a: &Value, b: &Value) -> bool {
    prepare_for_comparison(a) == prepare_for_comparison(b)
}

/// Returns true when a fresh payload differs from the stored one
///
/// A missing fresh payload is "no comparable data", never drift.
pub fn has_drift(stored: &Value, fresh: Option<&Value>) -> bool {
    match fresh {
        Some(fresh) => !payloads_equal(stored, fresh),
        None => false,
    }
}
