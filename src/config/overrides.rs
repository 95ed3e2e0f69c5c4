use crate::config::fragments::{ReceiverFragment, Value};
use crate::config::schema::ServiceOverride;

/// Applies a single service's override document onto the generated receiver
/// fragment for that service. List fields (`extra_attributes`) replace the
/// entire existing list/map rather than merging key-by-key; scalar fields
/// replace outright when present.
pub fn apply_override(receiver: &mut ReceiverFragment, over: &ServiceOverride) {
    if let Some(interval) = over.collection_interval {
        receiver
            .fields
            .insert("collection_interval".to_string(), Value::Int(interval as i64));
    }
    if let Some(endpoint) = &over.endpoint {
        receiver
            .fields
            .insert("endpoint".to_string(), Value::String(endpoint.clone()));
    }
    if let Some(extra) = &over.extra_attributes {
        let mut keys: Vec<&String> = extra.keys().collect();
        keys.sort();
        let pairs: Vec<String> = keys
            .into_iter()
            .map(|k| format!("{k}={}", extra[k]))
            .collect();
        receiver
            .fields
            .insert("extra_attributes".to_string(), Value::List(pairs));
    }
}
