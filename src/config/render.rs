use indexmap::IndexMap;

use crate::config::fragments::{
    ExporterFragment, Fields, PipelineFragment, ProcessorFragment, ProcessorStage,
    ReceiverFragment, RenderedDocument, Value,
};
use crate::config::overrides::apply_override;
use crate::config::schema::UserConfig;
use crate::discovery::service::{Service, ServiceType};
use crate::discovery::snapshot::DiscoverySnapshot;
use crate::generator::templates;

/// Builds the full rendered document for a discovery snapshot and the user's
/// config: one receiver per discovered, non-excluded service, the fixed
/// security/enrichment/transform/cardinality/batch processor chain, and a
/// single pipeline wiring all receivers through all processors to the
/// exporter.
pub fn render(user: &UserConfig, snapshot: &DiscoverySnapshot) -> RenderedDocument {
    let mut receivers = Vec::new();
    let mut receiver_names = Vec::new();

    for service in &snapshot.services {
        if is_excluded(user, service) {
            continue;
        }
        let Some(mut receiver) = templates::receiver_for(service) else {
            continue;
        };
        if let Some(over) = lookup_override(user, service) {
            apply_override(&mut receiver, over);
        }
        receiver_names.push(receiver.name.clone());
        receivers.push(receiver);
    }

    let processors = default_processors(user);
    let processor_names: Vec<String> = processors.iter().map(|p| p.name.clone()).collect();

    let exporters = vec![default_exporter()];
    let exporter_names: Vec<String> = exporters.iter().map(|e| e.name.clone()).collect();

    let pipelines = if receivers.is_empty() {
        Vec::new()
    } else {
        vec![PipelineFragment {
            name: "metrics".to_string(),
            receivers: receiver_names,
            processors: processor_names,
            exporters: exporter_names,
        }]
    };

    RenderedDocument {
        receivers,
        processors,
        exporters,
        pipelines,
    }
    .canonicalize()
}

fn is_excluded(user: &UserConfig, service: &Service) -> bool {
    user.auto_config
        .exclude_services
        .contains(&service.service_type.to_string())
}

fn lookup_override<'a>(
    user: &'a UserConfig,
    service: &Service,
) -> Option<&'a crate::config::schema::ServiceOverride> {
    user.auto_config
        .service_overrides
        .get(&service.service_type.to_string())
}

fn default_processors(user: &UserConfig) -> Vec<ProcessorFragment> {
    let mut security_fields = Fields::new();
    security_fields.insert("redact_license_key".to_string(), Value::Bool(true));

    let mut enrichment_fields = Fields::new();
    if let Some(name) = &user.service.name {
        enrichment_fields.insert("service.name".to_string(), Value::String(name.clone()));
    }
    if let Some(env) = &user.service.environment {
        enrichment_fields.insert(
            "service.environment".to_string(),
            Value::String(env.clone()),
        );
    }

    vec![
        ProcessorFragment {
            name: "redact".to_string(),
            kind: "attributes".to_string(),
            fields: security_fields,
            stage: ProcessorStage::Security,
        },
        ProcessorFragment {
            name: "resourcedetection".to_string(),
            kind: "resource".to_string(),
            fields: enrichment_fields,
            stage: ProcessorStage::Enrichment,
        },
        ProcessorFragment {
            name: "filter_internal".to_string(),
            kind: "filter".to_string(),
            fields: Fields::new(),
            stage: ProcessorStage::Transform,
        },
        ProcessorFragment {
            name: "cumulativetodelta".to_string(),
            kind: "cumulativetodelta".to_string(),
            fields: Fields::new(),
            stage: ProcessorStage::Cardinality,
        },
        ProcessorFragment {
            name: "batch".to_string(),
            kind: "batch".to_string(),
            fields: Fields::new(),
            stage: ProcessorStage::Batch,
        },
    ]
}

fn default_exporter() -> ExporterFragment {
    let mut fields = Fields::new();
    fields.insert(
        "endpoint".to_string(),
        Value::String("otlp.nr-data.net:4317".to_string()),
    );
    ExporterFragment {
        name: "otlp".to_string(),
        kind: "otlp".to_string(),
        fields,
    }
}

/// Collects the required environment variable names across every receiver
/// in `doc`, sorted and de-duplicated so the generator's output is stable.
pub fn required_env_vars(doc: &RenderedDocument) -> Vec<String> {
    let mut seen: IndexMap<String, ()> = IndexMap::new();
    for receiver in &doc.receivers {
        for name in templates::required_env_for_kind(&receiver.kind) {
            seen.insert(name.to_string(), ());
        }
    }
    let mut names: Vec<String> = seen.into_keys().collect();
    names.sort();
    names
}
