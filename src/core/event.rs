//! Event vocabulary and the triggers actions observe.

use super::error::{Fault, ServiceError};
use super::state::StatePath;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;

/// Trait for machine events.
///
/// Every event carries a tag (`kind`) used to look up transitions. Tags must
/// be exhaustive and mutually exclusive: `kinds()` lists every tag the type
/// can produce, and each value reports exactly one of them.
///
/// Implement it by hand or with [`event_enum!`](crate::event_enum).
///
/// # Example
///
/// ```rust
/// use appflow::core::Event;
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum DoorEvent {
///     Open,
///     Close,
/// }
///
/// impl Event for DoorEvent {
///     fn kind(&self) -> &'static str {
///         match self {
///             Self::Open => "OPEN",
///             Self::Close => "CLOSE",
///         }
///     }
///
///     fn kinds() -> &'static [&'static str] {
///         &["OPEN", "CLOSE"]
///     }
/// }
///
/// assert_eq!(DoorEvent::Open.kind(), "OPEN");
/// assert!(DoorEvent::kinds().contains(&DoorEvent::Close.kind()));
/// ```
pub trait Event: Clone + Debug + Send + Sync + 'static {
    /// The tag of this event.
    fn kind(&self) -> &'static str;

    /// Every tag this event type can produce.
    fn kinds() -> &'static [&'static str];
}

/// What caused the transition an action or service factory is running for.
///
/// External events arrive as [`Trigger::Event`]; the rest are raised by the
/// engine itself.
#[derive(Clone, Debug, PartialEq)]
pub enum Trigger<E> {
    /// Initial entry performed by `start`.
    Start,

    /// An event sent from outside the machine.
    Event(E),

    /// The named compound state reached one of its final children.
    Done { state: StatePath },

    /// An invoked service resolved successfully.
    ServiceDone { service: String, data: Value },

    /// An invoked service failed.
    ServiceError { service: String, error: ServiceError },

    /// An eventless transition was taken.
    Always,
}

impl<E: Event> Trigger<E> {
    /// Name used in logs and history records.
    pub fn name(&self) -> String {
        match self {
            Self::Start => "init".to_string(),
            Self::Event(event) => event.kind().to_string(),
            Self::Done { state } => format!("done.state.{}", state),
            Self::ServiceDone { service, .. } => format!("done.invoke.{}", service),
            Self::ServiceError { service, .. } => format!("error.invoke.{}", service),
            Self::Always => "always".to_string(),
        }
    }
}

impl<E> Trigger<E> {
    /// The external event, if this trigger is one.
    pub fn event(&self) -> Option<&E> {
        match self {
            Self::Event(event) => Some(event),
            _ => None,
        }
    }

    /// The resolved value of a successful service.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::ServiceDone { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Decode the resolved service value into `T`.
    ///
    /// Fails with a [`Fault`] when the trigger carries no service result or
    /// the payload does not have the expected shape.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, Fault> {
        let data = self
            .data()
            .ok_or_else(|| Fault::new("trigger carries no service result"))?;
        serde_json::from_value(data.clone())
            .map_err(|e| Fault::new(format!("unexpected service result shape: {}", e)))
    }

    /// The failure reported by a service.
    pub fn error(&self) -> Option<&ServiceError> {
        match self {
            Self::ServiceError { error, .. } => Some(error),
            _ => None,
        }
    }
}
