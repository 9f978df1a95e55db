use std::fmt;
use std::hash::Hash;

/// Identity of a node in the graph.
///
/// Identity, equality and hashing of a node are based solely on this value.
pub trait NodeId: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<T> NodeId for T where T: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{}

/// Value produced by a successful task attempt.
pub trait TaskOutput: Clone + fmt::Debug + Send + Sync + 'static {}

impl<R> TaskOutput for R where R: Clone + fmt::Debug + Send + Sync + 'static {}

/// Terminal status of a node, or of a single completed attempt.
///
/// Attempts coming back from the engine are only ever `Success`, `Errored`
/// or `Cancelled`; `Skipped` is decided by the scheduler without running
/// anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    Success,
    Errored,
    Skipped,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_success(self) -> bool {
        self == ExecutionStatus::Success
    }

    pub fn is_errored(self) -> bool {
        self == ExecutionStatus::Errored
    }

    pub fn is_skipped(self) -> bool {
        self == ExecutionStatus::Skipped
    }

    pub fn is_cancelled(self) -> bool {
        self == ExecutionStatus::Cancelled
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Errored => "errored",
            ExecutionStatus::Skipped => "skipped",
            ExecutionStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Lifecycle phase of a scheduler instance.
///
/// `Building -> Running -> Terminated`. A forced stop leaves the instance in
/// `Running` so the run can be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Building,
    Running,
    Terminated,
}

impl Phase {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Phase::Building => 0,
            Phase::Running => 1,
            Phase::Terminated => 2,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => Phase::Building,
            1 => Phase::Running,
            _ => Phase::Terminated,
        }
    }
}
