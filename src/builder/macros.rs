//! Macros for ergonomic event declarations.

/// Declare an event enum and implement [`Event`](crate::core::Event) for it.
///
/// Each variant carries the tag transitions are keyed by. Variants may hold
/// named fields.
///
/// # Example
///
/// ```
/// use appflow::event_enum;
/// use appflow::core::Event;
///
/// event_enum! {
///     pub enum LoginEvent {
///         Submit { email: String } => "SUBMIT",
///         Back => "BACK",
///     }
/// }
///
/// assert_eq!(LoginEvent::Back.kind(), "BACK");
/// assert_eq!(LoginEvent::kinds(), &["SUBMIT", "BACK"]);
/// ```
#[macro_export]
macro_rules! event_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $({ $($field:ident : $ty:ty),* $(,)? })? => $tag:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $({ $($field : $ty),* })?
            ),*
        }

        impl $crate::core::Event for $name {
            fn kind(&self) -> &'static str {
                match self {
                    $(Self::$variant { .. } => $tag),*
                }
            }

            fn kinds() -> &'static [&'static str] {
                &[$($tag),*]
            }
        }
    };
}
