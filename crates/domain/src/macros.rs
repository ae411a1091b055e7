//! Macro for implementing Display, FromStr and `as_str` for wire enums
//!
//! Report kinds and job statuses travel as lowercase strings. This macro keeps
//! the variant ↔ string table in one place for all three conversions.
//!
//! # Example
//!
//! ```rust
//! use kompete_domain::impl_wire_str_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Stage {
//!     Queued,
//!     Running,
//! }
//!
//! impl_wire_str_conversions!(Stage {
//!     Queued => "queued",
//!     Running => "running",
//! });
//!
//! assert_eq!(Stage::Running.as_str(), "running");
//! assert_eq!("QUEUED".parse::<Stage>().unwrap(), Stage::Queued);
//! ```

/// Implements `as_str`, Display and FromStr for string-valued enums
///
/// Parsing is case-insensitive and ignores surrounding whitespace; output is
/// always the canonical lowercase form.
#[macro_export]
macro_rules! impl_wire_str_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical wire representation.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
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
