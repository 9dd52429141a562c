//! The canonical event record.
//!
//! An [`Event`] is built once at ingestion time and never modified. Its
//! constructors enforce the branch invariant: a push has no source branch, a
//! pull request or merge always has one.

use serde::{Deserialize, Serialize};

use crate::{AuthorName, BranchName, RecordId, RequestId, Timestamp};

/// What happened in the repository, as derived from the source payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventAction {
    /// Commits were pushed to a branch.
    Push,
    /// A pull request was opened.
    PullRequest,
    /// Any other pull-request lifecycle change.
    ///
    /// Closing without merging, reopening and synchronising all land here; the
    /// source's own action string is not retained.
    Merge,
}

impl EventAction {
    /// Returns the wire form (`"PUSH"`, `"PULL_REQUEST"`, `"MERGE"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "PUSH",
            Self::PullRequest => "PULL_REQUEST",
            Self::Merge => "MERGE",
        }
    }

    /// Parses the wire form. Returns `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PUSH" => Some(Self::Push),
            "PULL_REQUEST" => Some(Self::PullRequest),
            "MERGE" => Some(Self::Merge),
            _ => None,
        }
    }

    /// Returns `true` if events with this action carry a source branch.
    pub fn has_source_branch(self) -> bool {
        !matches!(self, Self::Push)
    }
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------

/// A normalized repository event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EventFields")]
pub struct Event {
    request_id: RequestId,
    author: AuthorName,
    action: EventAction,
    from_branch: Option<BranchName>,
    to_branch: BranchName,
    timestamp: Timestamp,
}

impl Event {
    /// Creates a push event. Pushes never have a source branch.
    pub fn push(
        request_id: RequestId,
        author: AuthorName,
        to_branch: BranchName,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            request_id,
            author,
            action: EventAction::Push,
            from_branch: None,
            to_branch,
            timestamp,
        }
    }

    /// Creates a pull-request event (`PULL_REQUEST` or `MERGE`).
    ///
    /// Returns `None` if `action` is [`EventAction::Push`].
    pub fn pull_request(
        request_id: RequestId,
        author: AuthorName,
        action: EventAction,
        from_branch: BranchName,
        to_branch: BranchName,
        timestamp: Timestamp,
    ) -> Option<Self> {
        if !action.has_source_branch() {
            return None;
        }
        Some(Self {
            request_id,
            author,
            action,
            from_branch: Some(from_branch),
            to_branch,
            timestamp,
        })
    }

    /// Reassembles an event from its parts, e.g. when reading from storage.
    ///
    /// Returns `None` if the presence of `from_branch` contradicts `action`.
    pub fn from_parts(
        request_id: RequestId,
        author: AuthorName,
        action: EventAction,
        from_branch: Option<BranchName>,
        to_branch: BranchName,
        timestamp: Timestamp,
    ) -> Option<Self> {
        match (action.has_source_branch(), from_branch) {
            (false, None) => Some(Self::push(request_id, author, to_branch, timestamp)),
            (true, Some(from)) => {
                Self::pull_request(request_id, author, action, from, to_branch, timestamp)
            }
            _ => None,
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn author(&self) -> &AuthorName {
        &self.author
    }

    pub fn action(&self) -> EventAction {
        self.action
    }

    pub fn from_branch(&self) -> Option<&BranchName> {
        self.from_branch.as_ref()
    }

    pub fn to_branch(&self) -> &BranchName {
        &self.to_branch
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Unchecked field set used to deserialize an [`Event`] before validating it.
#[derive(Deserialize)]
struct EventFields {
    request_id: RequestId,
    author: AuthorName,
    action: EventAction,
    from_branch: Option<BranchName>,
    to_branch: BranchName,
    timestamp: Timestamp,
}

impl TryFrom<EventFields> for Event {
    type Error = String;

    fn try_from(f: EventFields) -> Result<Self, Self::Error> {
        let action = f.action;
        Self::from_parts(
            f.request_id,
            f.author,
            action,
            f.from_branch,
            f.to_branch,
            f.timestamp,
        )
        .ok_or_else(|| format!("from_branch presence does not match action {action}"))
    }
}

// ---------------------------------------------------------------------------

/// An [`Event`] together with the identifier its store assigned.
///
/// Serialises flat, with the record id under `"_id"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub event: Event,
}

impl StoredEvent {
    pub fn new(id: RecordId, event: Event) -> Self {
        Self { id, event }
    }
}
