//! Event Record - immutable behavioral events attributed to an arm

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// One of the two treatment groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arm {
    /// Baseline experience.
    Control,
    /// Treatment experience.
    Variant,
}

impl Arm {
    /// Wire name of the arm.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Variant => "variant",
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "control" => Ok(Self::Control),
            "variant" => Ok(Self::Variant),
            other => Err(Error::InvalidInput(format!("unknown arm: {other:?}"))),
        }
    }
}

/// Kind of behavioral event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// User was exposed to an arm (visitor credit).
    Assignment,
    /// User converted (conversion credit).
    Conversion,
    /// Page view; recorded but not counted.
    Pageview,
    /// Application-defined event; recorded but not counted.
    Custom,
}

/// Event Record represents one immutable entry in the event log.
///
/// The identity is assigned by the event log on append, so records built
/// by callers carry no `event_id` until they have been persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    event_id: Option<String>,
    experiment_id: String,
    user_id: String,
    session_id: Option<String>,
    event_type: EventType,
    arm: Arm,
    metadata: Option<serde_json::Value>,
    timestamp: DateTime<Utc>,
}

impl EventRecord {
    /// Create a new event stamped with the current time.
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        user_id: impl Into<String>,
        event_type: EventType,
        arm: Arm,
    ) -> Self {
        EventRecordBuilder::new(experiment_id, user_id, event_type, arm).build()
    }

    /// Shorthand for an `assignment` event.
    #[must_use]
    pub fn assignment(experiment_id: impl Into<String>, user_id: impl Into<String>, arm: Arm) -> Self {
        Self::new(experiment_id, user_id, EventType::Assignment, arm)
    }

    /// Shorthand for a `conversion` event.
    #[must_use]
    pub fn conversion(experiment_id: impl Into<String>, user_id: impl Into<String>, arm: Arm) -> Self {
        Self::new(experiment_id, user_id, EventType::Conversion, arm)
    }

    /// Create a builder for constructing an event with optional fields.
    #[must_use]
    pub fn builder(
        experiment_id: impl Into<String>,
        user_id: impl Into<String>,
        event_type: EventType,
        arm: Arm,
    ) -> EventRecordBuilder {
        EventRecordBuilder::new(experiment_id, user_id, event_type, arm)
    }

    /// Get the log-assigned identity, if persisted.
    #[must_use]
    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the user ID.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Get the session ID, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Get the event type.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Get the arm the event is attributed to.
    #[must_use]
    pub const fn arm(&self) -> Arm {
        self.arm
    }

    /// Get the metadata payload, if any.
    #[must_use]
    pub const fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }

    /// Get the event timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Attach the identity assigned by an event log.
    #[must_use]
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }
}

/// Builder for `EventRecord`.
#[derive(Debug)]
pub struct EventRecordBuilder {
    experiment_id: String,
    user_id: String,
    session_id: Option<String>,
    event_type: EventType,
    arm: Arm,
    metadata: Option<serde_json::Value>,
    timestamp: DateTime<Utc>,
}

impl EventRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        user_id: impl Into<String>,
        event_type: EventType,
        arm: Arm,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            user_id: user_id.into(),
            session_id: None,
            event_type,
            arm,
            metadata: None,
            timestamp: Utc::now(),
        }
    }

    /// Set the session ID.
    #[must_use]
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set the metadata payload.
    #[must_use]
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set a custom timestamp.
    #[must_use]
    pub const fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Build the `EventRecord`.
    #[must_use]
    pub fn build(self) -> EventRecord {
        EventRecord {
            event_id: None,
            experiment_id: self.experiment_id,
            user_id: self.user_id,
            session_id: self.session_id,
            event_type: self.event_type,
            arm: self.arm,
            metadata: self.metadata,
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_parse_and_display() {
        assert_eq!("control".parse::<Arm>().unwrap(), Arm::Control);
        assert_eq!("variant".parse::<Arm>().unwrap(), Arm::Variant);
        assert!("treatment".parse::<Arm>().is_err());
        assert_eq!(Arm::Variant.to_string(), "variant");
    }

    #[test]
    fn test_event_builder_optional_fields() {
        let event = EventRecord::builder("exp-1", "user-1", EventType::Custom, Arm::Control)
            .session_id("sess-9")
            .metadata(serde_json::json!({"button": "buy"}))
            .build();

        assert_eq!(event.session_id(), Some("sess-9"));
        assert!(event.metadata().is_some());
        assert!(event.event_id().is_none());
    }

    #[test]
    fn test_event_type_wire_names() {
        let json = serde_json::to_string(&EventRecord::conversion("e", "u", Arm::Variant)).unwrap();
        assert!(json.contains("\"event_type\":\"conversion\""));
        assert!(json.contains("\"arm\":\"variant\""));
    }
}
