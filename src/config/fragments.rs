use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A scalar-ish value a fragment can carry. Kept intentionally small: the
/// renderer never needs to represent arbitrary nested structures, only what
/// the starter template set emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// An ordered bag of named fields, used for every fragment kind so that
/// serialization order matches insertion order (a `HashMap` would not give
/// the determinism the rendering contract requires).
pub type Fields = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverFragment {
    pub name: String,
    pub kind: String,
    pub fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorFragment {
    pub name: String,
    pub kind: String,
    pub fields: Fields,
    pub stage: ProcessorStage,
}

/// The mandated pipeline ordering: security, then enrichment, then
/// transform, then cardinality, then batch, then export. `export` is
/// modeled separately as [`ExporterFragment`]; this enum covers the five
/// processor stages that precede it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorStage {
    Security,
    Enrichment,
    Transform,
    Cardinality,
    Batch,
}

impl ProcessorStage {
    pub const ORDERED: [ProcessorStage; 5] = [
        ProcessorStage::Security,
        ProcessorStage::Enrichment,
        ProcessorStage::Transform,
        ProcessorStage::Cardinality,
        ProcessorStage::Batch,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExporterFragment {
    pub name: String,
    pub kind: String,
    pub fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineFragment {
    pub name: String,
    pub receivers: Vec<String>,
    pub processors: Vec<String>,
    pub exporters: Vec<String>,
}

/// The full set of fragments that make up a rendered Collector document,
/// still in typed form (pre-serialization). Kept around on
/// [`crate::generator::GeneratedConfig`] so [`crate::config::diff`] can
/// compare documents structurally instead of re-parsing rendered YAML.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub receivers: Vec<ReceiverFragment>,
    pub processors: Vec<ProcessorFragment>,
    pub exporters: Vec<ExporterFragment>,
    pub pipelines: Vec<PipelineFragment>,
}

impl RenderedDocument {
    /// Sorts every section by name so identical logical content always
    /// serializes to identical bytes regardless of the order fragments were
    /// pushed in.
    pub fn canonicalize(mut self) -> Self {
        self.receivers.sort_by(|a, b| a.name.cmp(&b.name));
        self.processors.sort_by(|a, b| (a.stage, &a.name).cmp(&(b.stage, &b.name)));
        self.exporters.sort_by(|a, b| a.name.cmp(&b.name));
        self.pipelines.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }

    /// Serializes to a stable-key-order YAML document. Pipelines list their
    /// processors in mandated-order already, since [`Self::canonicalize`]
    /// sorted the processor section by `(stage, name)`.
    pub fn to_yaml_string(&self) -> String {
        #[derive(Serialize)]
        struct Doc<'a> {
            receivers: &'a Vec<ReceiverFragment>,
            processors: &'a Vec<ProcessorFragment>,
            exporters: &'a Vec<ExporterFragment>,
            pipelines: &'a Vec<PipelineFragment>,
        }
        let doc = Doc {
            receivers: &self.receivers,
            processors: &self.processors,
            exporters: &self.exporters,
            pipelines: &self.pipelines,
        };
        serde_yaml::to_string(&doc).expect("rendered document always serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_sorts_processors_by_stage_then_name() {
        let doc = RenderedDocument {
            processors: vec![
                ProcessorFragment {
                    name: "batch".into(),
                    kind: "batch".into(),
                    fields: Fields::new(),
                    stage: ProcessorStage::Batch,
                },
                ProcessorFragment {
                    name: "redact".into(),
                    kind: "attributes".into(),
                    fields: Fields::new(),
                    stage: ProcessorStage::Security,
                },
            ],
            ..Default::default()
        };
        let canon = doc.canonicalize();
        assert_eq!(canon.processors[0].name, "redact");
        assert_eq!(canon.processors[1].name, "batch");
    }

    #[test]
    fn to_yaml_string_is_deterministic() {
        let mut fields = Fields::new();
        fields.insert("port".to_string(), Value::Int(3306));
        let doc = RenderedDocument {
            receivers: vec![ReceiverFragment {
                name: "mysql".into(),
                kind: "mysql".into(),
                fields,
            }],
            ..Default::default()
        };
        let a = doc.clone().canonicalize().to_yaml_string();
        let b = doc.canonicalize().to_yaml_string();
        assert_eq!(a, b);
    }
}
