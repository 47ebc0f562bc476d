use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgileError {
    #[error("not initialized: no agile/ directory found (run 'agile init')")]
    NotInitialized,

    #[error("issue not found: {0}")]
    IssueNotFound(String),

    #[error("issue already exists: {0}")]
    IssueExists(String),

    #[error("issue '{name}' exists in several stages ({stages}); resolve the duplicate folders by hand")]
    AmbiguousIssue { name: String, stages: String },

    #[error("spec not found: {0}")]
    SpecNotFound(String),

    #[error("spec already exists: {0}")]
    SpecExists(String),

    #[error("technical guidance not found for issue '{0}'")]
    GuidanceNotFound(String),

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("invalid stage '{0}': expected one of 1-backlog, 2-todo, 3-in-progress, 4-review, 5-done")]
    InvalidStage(String),

    #[error("invalid issue type '{0}': expected one of feature, bug, task")]
    InvalidIssueType(String),

    #[error("invalid spec status '{0}': expected one of pending, in-progress, in-review, completed")]
    InvalidSpecStatus(String),

    #[error("invalid guidance status '{0}': expected one of draft, active, finalized")]
    InvalidGuidanceStatus(String),

    #[error("issue '{0}' is not a feature; discovery only applies to features")]
    NotAFeature(String),

    #[error("invalid transition from {from} to {to}: allowed targets are {allowed}")]
    InvalidTransition {
        from: String,
        to: String,
        allowed: String,
    },

    #[error("{action} blocked:{}", bullet_list(.missing))]
    ValidationFailed { action: String, missing: Vec<String> },

    #[error("timed out waiting for lock on issue '{0}'")]
    LockTimeout(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AgileError {
    /// Convenience constructor for gate and validator failures.
    pub fn validation(action: impl Into<String>, missing: Vec<String>) -> Self {
        AgileError::ValidationFailed {
            action: action.into(),
            missing,
        }
    }
}

fn bullet_list(items: &[String]) -> String {
    items.iter().map(|m| format!("\n  - {m}")).collect()
}

pub type Result<T> = std::result::Result<T, AgileError>;
