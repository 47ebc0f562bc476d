use crate::error::AgileError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "1-backlog")]
    Backlog,
    #[serde(rename = "2-todo")]
    Todo,
    #[serde(rename = "3-in-progress")]
    InProgress,
    #[serde(rename = "4-review")]
    Review,
    #[serde(rename = "5-done")]
    Done,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Backlog,
            Stage::Todo,
            Stage::InProgress,
            Stage::Review,
            Stage::Done,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Stage> {
        Stage::all().get(self.index() + 1).copied()
    }

    pub fn prev(self) -> Option<Stage> {
        self.index().checked_sub(1).map(|i| Stage::all()[i])
    }

    /// Immediate neighbours: the only stages a move may target.
    pub fn neighbours(self) -> Vec<Stage> {
        self.prev().into_iter().chain(self.next()).collect()
    }

    pub fn is_adjacent(self, other: Stage) -> bool {
        self.index().abs_diff(other.index()) == 1
    }

    /// Directory name under `agile/`.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Backlog => "1-backlog",
            Stage::Todo => "2-todo",
            Stage::InProgress => "3-in-progress",
            Stage::Review => "4-review",
            Stage::Done => "5-done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = AgileError;

    /// Accepts the directory name, the bare label or the bare number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1-backlog" | "backlog" | "1" => Ok(Stage::Backlog),
            "2-todo" | "todo" | "2" => Ok(Stage::Todo),
            "3-in-progress" | "in-progress" | "in_progress" | "3" => Ok(Stage::InProgress),
            "4-review" | "review" | "4" => Ok(Stage::Review),
            "5-done" | "done" | "5" => Ok(Stage::Done),
            _ => Err(AgileError::InvalidStage(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// IssueType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Feature,
    Bug,
    Task,
}

impl IssueType {
    pub fn all() -> &'static [IssueType] {
        &[IssueType::Feature, IssueType::Bug, IssueType::Task]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::Feature => "feature",
            IssueType::Bug => "bug",
            IssueType::Task => "task",
        }
    }

    /// Name of the main document inside the issue folder.
    pub fn filename(self) -> &'static str {
        match self {
            IssueType::Feature => "feature.md",
            IssueType::Bug => "bug.md",
            IssueType::Task => "task.md",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IssueType {
    type Err = AgileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feature" => Ok(IssueType::Feature),
            "bug" => Ok(IssueType::Bug),
            "task" => Ok(IssueType::Task),
            _ => Err(AgileError::InvalidIssueType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// SpecStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecStatus {
    Pending,
    InProgress,
    InReview,
    Completed,
}

impl SpecStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SpecStatus::Pending => "pending",
            SpecStatus::InProgress => "in-progress",
            SpecStatus::InReview => "in-review",
            SpecStatus::Completed => "completed",
        }
    }

    /// Listing order: actionable work first.
    pub fn sort_rank(self) -> u8 {
        match self {
            SpecStatus::InProgress => 0,
            SpecStatus::InReview => 1,
            SpecStatus::Pending => 2,
            SpecStatus::Completed => 3,
        }
    }
}

impl fmt::Display for SpecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SpecStatus {
    type Err = AgileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SpecStatus::Pending),
            "in-progress" | "in_progress" => Ok(SpecStatus::InProgress),
            "in-review" | "in_review" => Ok(SpecStatus::InReview),
            "completed" => Ok(SpecStatus::Completed),
            _ => Err(AgileError::InvalidSpecStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// GuidanceStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceStatus {
    Draft,
    Active,
    Finalized,
}

impl GuidanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GuidanceStatus::Draft => "draft",
            GuidanceStatus::Active => "active",
            GuidanceStatus::Finalized => "finalized",
        }
    }
}

impl fmt::Display for GuidanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GuidanceStatus {
    type Err = AgileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(GuidanceStatus::Draft),
            "active" => Ok(GuidanceStatus::Active),
            "finalized" => Ok(GuidanceStatus::Finalized),
            _ => Err(AgileError::InvalidGuidanceStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// DiscoveryPhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryPhase {
    NotStarted,
    Persona,
    Paths,
    Scope,
    Synthesize,
    Complete,
}

impl DiscoveryPhase {
    pub fn all() -> &'static [DiscoveryPhase] {
        &[
            DiscoveryPhase::NotStarted,
            DiscoveryPhase::Persona,
            DiscoveryPhase::Paths,
            DiscoveryPhase::Scope,
            DiscoveryPhase::Synthesize,
            DiscoveryPhase::Complete,
        ]
    }

    pub fn next(self) -> Option<DiscoveryPhase> {
        DiscoveryPhase::all().get(self as usize + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiscoveryPhase::NotStarted => "not_started",
            DiscoveryPhase::Persona => "persona",
            DiscoveryPhase::Paths => "paths",
            DiscoveryPhase::Scope => "scope",
            DiscoveryPhase::Synthesize => "synthesize",
            DiscoveryPhase::Complete => "complete",
        }
    }

    /// What the author is expected to produce while in this phase.
    pub fn guide(self) -> &'static str {
        match self {
            DiscoveryPhase::NotStarted => {
                "Discovery has not started. Advance to begin with the user persona."
            }
            DiscoveryPhase::Persona => {
                "Describe who the feature is for under 'User Persona' and the pain they feel under 'Problem Statement'."
            }
            DiscoveryPhase::Paths => {
                "Walk the happy path and the failure paths. Draft them as Given/When/Then scenarios in a gherkin block."
            }
            DiscoveryPhase::Scope => {
                "List what this feature will not do under 'Out of Scope' and what you are taking for granted under 'Assumptions'."
            }
            DiscoveryPhase::Synthesize => {
                "Tighten the scenarios and remove every placeholder. Advancing runs the BDD validator."
            }
            DiscoveryPhase::Complete => {
                "Discovery is complete. The feature can move to 2-todo once its description is filled in."
            }
        }
    }
}

impl fmt::Display for DiscoveryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiscoveryPhase {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiscoveryPhase::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
