//! Macro for implementing Display and FromStr for keyword enums
//!
//! Keyword enums (operation kinds, fetch policies) have a single canonical
//! lowercase spelling. The macro generates both directions from one table.
//!
//! # Example
//!
//! ```rust
//! use gqlink_domain::impl_keyword_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Channel {
//!     Http,
//!     WebSocket,
//! }
//!
//! impl_keyword_conversions!(Channel {
//!     Http => "http",
//!     WebSocket => "websocket",
//! });
//! ```

/// Implements Display and FromStr traits for keyword enums
///
/// - Display writes the canonical keyword
/// - FromStr parses case-insensitively and reports the enum name on failure
#[macro_export]
macro_rules! impl_keyword_conversions {
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
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
