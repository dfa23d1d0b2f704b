use std::path::PathBuf;
use thiserror::Error;

/// Outcomes of mutation primitives that do not apply.
///
/// The tree is left structurally unchanged whenever one of these is returned;
/// the caller decides whether to log, retry, or surface the condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("node '{node}' is not a child of '{parent}'")]
    NodeNotFound { node: String, parent: String },

    #[error("index {index} is outside the {gaps} valid gaps of '{parent}'")]
    SlotOutOfRange {
        parent: String,
        index: usize,
        gaps: usize,
    },

    #[error("'{parent}' is a leaf and cannot hold children")]
    NotComposite { parent: String },

    #[error("node '{node}' is still attached to a parent")]
    AlreadyAttached { node: String },

    #[error("moving '{node}' into its own subtree would create a cycle")]
    WouldCreateCycle { node: String },

    #[error("stale node reference")]
    StaleIndex,
}

pub type MutationResult<T> = Result<T, MutationError>;

/// Errors while loading a resource file and building trees from it.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("resource file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read resource file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("invalid resource format in {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("subgoal '{subgoal}' references unknown behavior id '{id}'")]
    UnknownBehavior { subgoal: String, id: String },

    #[error("duplicate behavior id '{id}' in subgoal '{subgoal}'")]
    DuplicateBehavior { subgoal: String, id: String },
}

pub type BuildResult<T> = Result<T, BuildError>;

/// Errors at the experiment-session boundary.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("results file is not writable: {0}")]
    ResultsFile(PathBuf),

    #[error("manipulation round failed: {0}")]
    Round(#[from] MutationError),

    #[error("terminal interaction failed: {0}")]
    Terminal(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
