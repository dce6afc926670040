//! Guard predicates for controlling transitions.
//!
//! Guards are pure functions of the machine context that decide whether a
//! transition may fire. They never see a mutable context.

use super::error::Fault;
use std::fmt;
use std::sync::Arc;

type Predicate<C> = Arc<dyn Fn(&C) -> Result<bool, Fault> + Send + Sync>;

/// Named, pure predicate over the context.
///
/// Guards are evaluated in declaration order when several transitions
/// answer the same event; the first one that passes wins.
///
/// # Example
///
/// ```rust
/// use appflow::core::Guard;
///
/// #[derive(Clone, Debug)]
/// struct Session {
///     user_id: Option<String>,
/// }
///
/// let is_logged_in = Guard::new("isLoggedIn", |s: &Session| s.user_id.is_some());
///
/// assert!(is_logged_in.check(&Session { user_id: Some("abc".into()) }).unwrap());
/// assert!(!is_logged_in.check(&Session { user_id: None }).unwrap());
/// assert_eq!(is_logged_in.name(), "isLoggedIn");
/// ```
pub struct Guard<C> {
    name: &'static str,
    predicate: Predicate<C>,
}

impl<C> Guard<C> {
    /// Create a guard from an infallible predicate.
    pub fn new<F>(name: &'static str, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            predicate: Arc::new(move |context| Ok(predicate(context))),
        }
    }

    /// Create a guard whose evaluation can fail.
    ///
    /// A failing guard aborts the `send` that evaluated it.
    pub fn fallible<F>(name: &'static str, predicate: F) -> Self
    where
        F: Fn(&C) -> Result<bool, Fault> + Send + Sync + 'static,
    {
        Self {
            name,
            predicate: Arc::new(predicate),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Evaluate the guard against `context`.
    pub fn check(&self, context: &C) -> Result<bool, Fault> {
        (self.predicate)(context)
    }
}

impl<C> Clone for Guard<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").field("name", &self.name).finish()
    }
}
