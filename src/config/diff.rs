use crate::config::fragments::RenderedDocument;

/// A single element-level change between two rendered documents, named by
/// section and fragment name.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    ReceiverAdded(String),
    ReceiverRemoved(String),
    ReceiverChanged(String),
    ProcessorAdded(String),
    ProcessorRemoved(String),
    ProcessorChanged(String),
    ExporterAdded(String),
    ExporterRemoved(String),
    ExporterChanged(String),
    PipelineAdded(String),
    PipelineRemoved(String),
    PipelineChanged(String),
}

/// The set of changes between two documents. Always built against
/// canonicalized documents, so the result is stable regardless of the order
/// fragments happened to be produced in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Computes the difference between `from` and `to`. Both are canonicalized
/// first so element order never affects the result.
pub fn diff(from: &RenderedDocument, to: &RenderedDocument) -> ChangeSet {
    let from = from.clone().canonicalize();
    let to = to.clone().canonicalize();

    let mut changes = Vec::new();

    diff_section(
        &from.receivers,
        &to.receivers,
        |r| r.name.clone(),
        Change::ReceiverAdded,
        Change::ReceiverRemoved,
        Change::ReceiverChanged,
        &mut changes,
    );
    diff_section(
        &from.processors,
        &to.processors,
        |p| p.name.clone(),
        Change::ProcessorAdded,
        Change::ProcessorRemoved,
        Change::ProcessorChanged,
        &mut changes,
    );
    diff_section(
        &from.exporters,
        &to.exporters,
        |e| e.name.clone(),
        Change::ExporterAdded,
        Change::ExporterRemoved,
        Change::ExporterChanged,
        &mut changes,
    );
    diff_section(
        &from.pipelines,
        &to.pipelines,
        |p| p.name.clone(),
        Change::PipelineAdded,
        Change::PipelineRemoved,
        Change::PipelineChanged,
        &mut changes,
    );

    ChangeSet { changes }
}

fn diff_section<T: PartialEq>(
    from: &[T],
    to: &[T],
    name_of: impl Fn(&T) -> String,
    added: impl Fn(String) -> Change,
    removed: impl Fn(String) -> Change,
    changed: impl Fn(String) -> Change,
    out: &mut Vec<Change>,
) {
    for to_item in to {
        let name = name_of(to_item);
        match from.iter().find(|from_item| name_of(from_item) == name) {
            None => out.push(added(name)),
            Some(from_item) if from_item != to_item => out.push(changed(name)),
            Some(_) => {}
        }
    }
    for from_item in from {
        let name = name_of(from_item);
        if !to.iter().any(|to_item| name_of(to_item) == name) {
            out.push(removed(name));
        }
    }
}
