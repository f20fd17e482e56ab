use gamelytics_data::AbGroup;
use serde::Serialize;

/// Non-fatal analyzer failure; the dashboard shows it in place of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_more::Display, derive_more::Error)]
pub enum AnalysisError {
    #[display("no players match the current filters")]
    EmptyView,
    #[display("not enough players: need at least {required}, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[display("A/B group {group} needs at least {required} players, got {actual}")]
    InsufficientGroupData {
        #[error(not(source))]
        group: AbGroup,
        required: usize,
        actual: usize,
    },
}
