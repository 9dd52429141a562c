//! Maps source payloads onto the canonical [`Event`].
//!
//! The kind comes from the event-kind header, not the body. Each supported kind
//! names the fields it requires; the first one that is missing, null, empty or
//! of the wrong type aborts normalization with its dotted path. Nothing is ever
//! partially built.

use serde_json::Value;

use crate::{
    AuthorName, BranchName, Event, EventAction, NormalizationError, RequestId, Timestamp,
};

/// Event kinds this service records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Push,
    PullRequest,
}

impl EventKind {
    /// Parses an event-kind header value (`"push"`, `"pull_request"`).
    pub fn parse(kind: &str) -> Result<Self, NormalizationError> {
        match kind {
            "push" => Ok(Self::Push),
            "pull_request" => Ok(Self::PullRequest),
            other => Err(NormalizationError::UnsupportedEventKind {
                kind: other.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
        }
    }
}

/// Normalizes one payload of the given kind, stamping it with `timestamp`.
pub fn normalize(
    kind: &str,
    payload: &Value,
    timestamp: Timestamp,
) -> Result<Event, NormalizationError> {
    match EventKind::parse(kind)? {
        EventKind::Push => normalize_push(payload, timestamp),
        EventKind::PullRequest => normalize_pull_request(payload, timestamp),
    }
}

fn normalize_push(payload: &Value, timestamp: Timestamp) -> Result<Event, NormalizationError> {
    let request_id = required(payload, &["head_commit", "id"], RequestId::new)?;
    let author = required(payload, &["pusher", "name"], AuthorName::new)?;
    let git_ref = string_at(payload, &["ref"])?;
    let to_branch = BranchName::new(branch_from_ref(git_ref)).ok_or_else(|| malformed(&["ref"]))?;

    Ok(Event::push(request_id, author, to_branch, timestamp))
}

fn normalize_pull_request(
    payload: &Value,
    timestamp: Timestamp,
) -> Result<Event, NormalizationError> {
    let request_id = pull_request_id(payload)?;
    let author = required(payload, &["pull_request", "user", "login"], AuthorName::new)?;
    let from_branch = required(payload, &["pull_request", "head", "ref"], BranchName::new)?;
    let to_branch = required(payload, &["pull_request", "base", "ref"], BranchName::new)?;
    let action = match string_at(payload, &["action"])? {
        "opened" => EventAction::PullRequest,
        _ => EventAction::Merge,
    };

    Event::pull_request(request_id, author, action, from_branch, to_branch, timestamp)
        .ok_or_else(|| malformed(&["action"]))
}

/// Final `/`-separated segment of a Git ref.
///
/// Assumes `refs/heads/<branch>`. Branch names that themselves contain `/` and
/// tag refs (`refs/tags/v1.0` gives `v1.0`) are reduced to their last segment
/// as well.
pub fn branch_from_ref(git_ref: &str) -> &str {
    git_ref.rsplit('/').next().unwrap_or(git_ref)
}

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

fn malformed(path: &[&str]) -> NormalizationError {
    NormalizationError::MalformedPayload {
        path: path.join("."),
    }
}

fn lookup<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(payload, |value, key| value.get(key))
}

fn string_at<'a>(payload: &'a Value, path: &[&str]) -> Result<&'a str, NormalizationError> {
    lookup(payload, path)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(path))
}

fn required<T>(
    payload: &Value,
    path: &[&str],
    build: impl FnOnce(String) -> Option<T>,
) -> Result<T, NormalizationError> {
    build(string_at(payload, path)?.to_string()).ok_or_else(|| malformed(path))
}

/// The pull-request id is an integer on the wire; a string is tolerated.
fn pull_request_id(payload: &Value) -> Result<RequestId, NormalizationError> {
    const PATH: &[&str] = &["pull_request", "id"];
    let raw = match lookup(payload, PATH) {
        Some(Value::Number(n)) if n.is_u64() || n.is_i64() => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => return Err(malformed(PATH)),
    };
    RequestId::new(raw).ok_or_else(|| malformed(PATH))
}
