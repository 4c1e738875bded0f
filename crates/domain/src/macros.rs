//! Macro for implementing Display and FromStr for status enums
//!
//! Gives every status enum the same string representation in the store, the
//! HTTP surface and the logs.
//!
//! # Example
//!
//! ```rust
//! use leadsync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum CallOutcome {
//!     Answered,
//!     Voicemail,
//! }
//!
//! impl_domain_status_conversions!(CallOutcome {
//!     Answered => "answered",
//!     Voicemail => "voicemail",
//! });
//!
//! assert_eq!(CallOutcome::Voicemail.to_string(), "voicemail");
//! ```

/// Implements Display and FromStr traits for status enums
///
/// - Display: writes the mapped string
/// - FromStr: case-insensitive, surrounding whitespace ignored
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical string representation
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
