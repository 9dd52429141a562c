//! Newtype domain identifiers.
//!
//! Every value lifted out of a webhook payload is wrapped in a distinct newtype
//! so that a [`BranchName`] can never be passed where an [`AuthorName`] is
//! expected, even though both are strings under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or_else(|| {
                    format!("{} must not be empty", stringify!($name))
                })
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — payload-derived
// ---------------------------------------------------------------------------

string_id! {
    /// Source-side identity of an event.
    ///
    /// The head commit SHA for pushes, the pull-request id (decimal) for pull
    /// requests. Unique only within its own id space; two repositories can
    /// produce the same value.
    RequestId
}

string_id! {
    /// The pusher name or pull-request author login.
    AuthorName
}

string_id! {
    /// A Git branch name (e.g. `"main"`, `"feature/login"`).
    BranchName
}

string_id! {
    /// Host-assigned id of one webhook delivery attempt (`X-GitHub-Delivery`).
    ///
    /// Only used to correlate log lines; never persisted.
    DeliveryId
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one stored record.
///
/// Assigned by the event store on insert. Rendered as a hyphenated string on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generates a new random record identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`RecordId`] from an existing UUID (e.g. read back from storage).
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_are_rejected() {
        assert!(BranchName::new("").is_none());
        assert_eq!(BranchName::new("main").unwrap().as_str(), "main");
    }

    #[test]
    fn string_ids_serialize_as_plain_strings() {
        let author = AuthorName::new("octocat").unwrap();
        assert_eq!(serde_json::to_value(&author).unwrap(), "octocat");

        let err = serde_json::from_value::<AuthorName>(serde_json::json!("")).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn record_id_renders_as_hyphenated_uuid() {
        let id = RecordId::new_random();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json.as_str().unwrap(), id.to_string());
        assert_eq!(id.to_string().len(), 36);
    }
}
