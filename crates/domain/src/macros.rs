//! Macro for implementing Display and FromStr for domain enums
//!
//! Several domain enums (roles, session status, storage backends) travel as
//! lowercase strings on the wire and in configuration. This macro keeps their
//! `Display`/`FromStr` pair in one place with case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use civicreport_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum TicketState {
//!     Open,
//!     Assigned,
//!     Resolved,
//! }
//!
//! impl_domain_status_conversions!(TicketState {
//!     Open => "open",
//!     Assigned => "assigned",
//!     Resolved => "resolved",
//! });
//! ```

/// Implements Display and FromStr traits for lowercase-string enums
///
/// - `Display` writes the mapped lowercase string
/// - `FromStr` trims and lowercases the input before matching
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

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
