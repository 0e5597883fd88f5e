//! Application-wide constants
//!
//! Limits and patterns shared by validation, the data loader and tests.

use once_cell::sync::Lazy;
use regex::Regex;

/// Largest accepted ingredient amount (a positive small integer).
pub const MAX_AMOUNT: i64 = 32_767;

pub const MIN_PASSWORD_LENGTH: u64 = 8;

/// Color given to tags loaded without one.
pub const DEFAULT_TAG_COLOR: &str = "#FF0000";

/// Letters, digits and `@ . + - _`.
pub static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern compiles"));

pub static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern compiles"));

/// `#RRGGBB`
pub static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("color pattern compiles"));
