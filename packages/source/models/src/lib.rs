#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Repository scope and record types for GitHub Actions workflows and
//! workflow runs.
//!
//! Records keep the full JSON payload exactly as the API returned it next
//! to the handful of typed fields the store and the aggregation query
//! need. Identifiers are carried as strings regardless of whether the
//! source sends them as numbers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use strum_macros::AsRefStr;

/// Conclusion value that marks a workflow run as successful.
pub const SUCCESS_CONCLUSION: &str = "success";

/// A record identifier, normalized to a string.
pub type RecordId = String;

/// Errors produced while parsing scopes or raw records.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A required field was absent or null.
    #[error("Record is missing required field '{field}'")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field was present but had the wrong JSON type.
    #[error("Field '{field}' has unexpected type: {value}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// The raw value that was found.
        value: String,
    },

    /// A timestamp field could not be parsed as RFC 3339.
    #[error("Field '{field}' is not a valid RFC 3339 timestamp: {value:?}")]
    InvalidTimestamp {
        /// Name of the offending field.
        field: &'static str,
        /// The raw string that failed to parse.
        value: String,
    },

    /// A repository scope was not in `owner/name` form.
    #[error("Invalid repository {input:?}: expected the form owner/name")]
    InvalidRepository {
        /// The rejected input.
        input: String,
    },
}

/// The repository whose workflows are ingested, in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Repository {
    /// Account or organization that owns the repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl FromStr for Repository {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidRepository {
            input: s.to_owned(),
        };

        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The two collections fetched from the remote service.
///
/// The `snake_case` form doubles as the JSON key wrapping each page's
/// records and as the store's table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    /// Workflow definitions of a repository.
    Workflows,
    /// Runs of a single workflow.
    WorkflowRuns,
}

/// A paginated collection on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resource {
    /// All workflows defined in a repository.
    Workflows {
        /// Owning repository.
        repo: Repository,
    },
    /// All runs of one workflow.
    WorkflowRuns {
        /// Owning repository.
        repo: Repository,
        /// Identifier of the workflow whose runs are listed.
        workflow_id: RecordId,
    },
}

impl Resource {
    /// Returns which collection this resource lists.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Workflows { .. } => ResourceKind::Workflows,
            Self::WorkflowRuns { .. } => ResourceKind::WorkflowRuns,
        }
    }

    /// Returns the repository the resource belongs to.
    #[must_use]
    pub const fn repo(&self) -> &Repository {
        match self {
            Self::Workflows { repo } | Self::WorkflowRuns { repo, .. } => repo,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workflows { repo } => write!(f, "{repo} workflows"),
            Self::WorkflowRuns { repo, workflow_id } => {
                write!(f, "{repo} workflow {workflow_id} runs")
            }
        }
    }
}

/// A workflow definition (the parent record).
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    /// Stable workflow identifier.
    pub id: RecordId,
    /// Display name of the workflow.
    pub name: String,
    /// Path of the workflow file inside the repository.
    pub path: String,
    /// The record exactly as retrieved.
    pub payload: serde_json::Value,
}

impl TryFrom<serde_json::Value> for Workflow {
    type Error = ModelError;

    fn try_from(payload: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(Self {
            id: required_id(&payload, "id")?,
            name: required_str(&payload, "name")?,
            path: required_str(&payload, "path")?,
            payload,
        })
    }
}

/// A single execution of a workflow (the child record).
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowRun {
    /// Stable run identifier.
    pub id: RecordId,
    /// Identifier of the workflow this run belongs to.
    pub workflow_id: RecordId,
    /// When the run actually started executing.
    pub run_started_at: Option<DateTime<Utc>>,
    /// When the run was last updated (its end time once completed).
    pub updated_at: Option<DateTime<Utc>>,
    /// When the run was created. Used for windowing.
    pub created_at: Option<DateTime<Utc>>,
    /// Outcome of the run; `None` while still in progress.
    pub conclusion: Option<String>,
    /// The record exactly as retrieved.
    pub payload: serde_json::Value,
}

impl TryFrom<serde_json::Value> for WorkflowRun {
    type Error = ModelError;

    fn try_from(payload: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(Self {
            id: required_id(&payload, "id")?,
            workflow_id: required_id(&payload, "workflow_id")?,
            run_started_at: optional_timestamp(&payload, "run_started_at")?,
            updated_at: optional_timestamp(&payload, "updated_at")?,
            created_at: optional_timestamp(&payload, "created_at")?,
            conclusion: optional_str(&payload, "conclusion")?,
            payload,
        })
    }
}

/// Extracts an identifier that may be encoded as a JSON string or number.
fn required_id(record: &serde_json::Value, field: &'static str) -> Result<RecordId, ModelError> {
    match record.get(field) {
        None | Some(serde_json::Value::Null) => Err(ModelError::MissingField { field }),
        Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(ModelError::InvalidField {
            field,
            value: other.to_string(),
        }),
    }
}

fn required_str(record: &serde_json::Value, field: &'static str) -> Result<String, ModelError> {
    optional_str(record, field)?.ok_or(ModelError::MissingField { field })
}

fn optional_str(
    record: &serde_json::Value,
    field: &'static str,
) -> Result<Option<String>, ModelError> {
    match record.get(field) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ModelError::InvalidField {
            field,
            value: other.to_string(),
        }),
    }
}

fn optional_timestamp(
    record: &serde_json::Value,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, ModelError> {
    optional_str(record, field)?
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| ModelError::InvalidTimestamp { field, value: raw })
        })
        .transpose()
}
