//! Correlation ids
//!
//! A `SessionId` names one open model for the lifetime of its event loop; a
//! `RequestId` names one dispatched action. Both are UUIDv7 strings, so ids
//! from one session sort by creation time in log output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! time_ordered_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        /// Accepts only well-formed UUIDs, normalised to hyphenated lowercase
        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(|u| Self(u.hyphenated().to_string()))
            }
        }
    };
}

time_ordered_id!(
    /// Id of one dispatched action
    RequestId
);

time_ordered_id!(
    /// Id of one editing session
    SessionId
);

/// Ids attached to the span of one dispatch cycle
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub session_id: Option<SessionId>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let first = SessionId::new();
        let second = SessionId::new();
        assert_ne!(first, second);
    }

    #[test]
    fn test_parse_normalises_and_rejects_garbage() {
        let id: RequestId = "0190B5C2-7A3E-7000-8000-000000000001".parse().unwrap();
        assert_eq!(id.as_str(), "0190b5c2-7a3e-7000-8000-000000000001");
        assert_eq!(id.to_string(), id.as_str());

        assert!("not-a-uuid".parse::<RequestId>().is_err());
    }

    #[test]
    fn test_context_carries_session() {
        let session = SessionId::new();
        let ctx = RequestContext::new().with_session_id(session.clone());
        assert_eq!(ctx.session_id, Some(session));
        assert!(!ctx.request_id.as_str().is_empty());
    }

    #[test]
    fn test_serialises_as_plain_string() {
        let id = RequestId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
