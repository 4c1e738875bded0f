//! Phone-token heuristics for matching calendar events to leads.
//!
//! Best-effort only. A token is a maximal run of exactly 10 or 11 ASCII
//! digits in the event title (then description). A lead matches when one of
//! its phones, reduced to digits, contains the token. Formatted numbers
//! (`(11) 98765-4321`) in event text are missed, and a token can collide
//! with an unrelated longer number that happens to contain it.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::Lead;

static PHONE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{10,11})(?:[^0-9]|$)")
        .expect("PHONE_TOKEN should compile - this is a bug")
});

/// Digits extracted from event text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneToken(String);

impl PhoneToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn token_in(text: &str) -> Option<PhoneToken> {
    PHONE_TOKEN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| PhoneToken(m.as_str().to_string()))
}

/// First phone token in `title`, falling back to `description`.
#[must_use]
pub fn extract_phone_token(title: Option<&str>, description: Option<&str>) -> Option<PhoneToken> {
    title.and_then(token_in).or_else(|| description.and_then(token_in))
}

/// Keep ASCII digits only.
#[must_use]
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Whether any of the lead's phones contains the token.
#[must_use]
pub fn phone_matches(lead: &Lead, token: &PhoneToken) -> bool {
    lead.phones().any(|phone| {
        let digits = digits_only(phone);
        !digits.is_empty() && digits.contains(token.as_str())
    })
}
