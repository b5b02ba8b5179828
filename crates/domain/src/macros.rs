//! Macro for implementing Display and FromStr for status enums
//!
//! Backend status values travel as fixed strings (`"APPROVED"`,
//! `"keychain"`). This macro gives each enum one canonical wire string per
//! variant and case-insensitive parsing back from it.
//!
//! # Example
//!
//! ```rust
//! use kinderhub_domain::impl_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum FeeStatus {
//!     Unpaid,
//!     Paid,
//! }
//!
//! impl_status_conversions!(FeeStatus {
//!     Unpaid => "UNPAID",
//!     Paid => "PAID",
//! });
//!
//! assert_eq!(FeeStatus::Paid.to_string(), "PAID");
//! assert_eq!("paid".parse::<FeeStatus>(), Ok(FeeStatus::Paid));
//! ```

/// Implements Display and FromStr traits for status enums
///
/// This macro generates:
/// - Display trait: writes the canonical string of the variant
/// - FromStr trait: parses case-insensitive strings to enum variants
#[macro_export]
macro_rules! impl_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
