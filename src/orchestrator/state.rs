/// The orchestrator loop's state machine (§4.7): `Idle → Discovering →
/// Reporting → Fetching → Generating → Applying → Idle`. Kept as a plain
/// enum matched in a loop rather than an event-sourced framework; every
/// transition is logged with the previous/next pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Discovering,
    Reporting,
    Fetching,
    Generating,
    Applying,
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OrchestratorState::Idle => "idle",
            OrchestratorState::Discovering => "discovering",
            OrchestratorState::Reporting => "reporting",
            OrchestratorState::Fetching => "fetching",
            OrchestratorState::Generating => "generating",
            OrchestratorState::Applying => "applying",
        };
        write!(f, "{label}")
    }
}

/// What happened to the diff-gated candidate in the most recent cycle, for
/// status reporting and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The candidate was identical to the active config; nothing applied.
    NoChange,
    Applied { version: u64 },
    AppliedFailure { rolled_back: bool },
}
