//! Macro for implementing Display and FromStr for status enums
//!
//! Ledger files store statuses as lowercase strings; this macro keeps the
//! string form and the parser in one place.
//!
//! # Example
//!
//! ```rust
//! use leadsync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum RunPhase {
//!     Loading,
//!     Upserting,
//!     Done,
//! }
//!
//! impl_domain_status_conversions!(RunPhase {
//!     Loading => "loading",
//!     Upserting => "upserting",
//!     Done => "done",
//! });
//! ```

/// Implements Display and FromStr traits for status enums
///
/// Parsing is case-insensitive; display is always the mapped string.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
