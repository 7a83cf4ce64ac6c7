//! Reusable match validators.
//!
//! The boundary checks accept a match touching the start or end of the input.

use std::sync::Arc;

use crate::matches::Match;
use crate::pattern::Validator;
use crate::utils::{char_at, char_before};

/// Accepts matches preceded by one of `chars`.
pub fn chars_before(chars: impl Into<String>) -> Validator {
    let chars = chars.into();
    Arc::new(move |m: &Match| before(&chars, m))
}

/// Accepts matches followed by one of `chars`.
pub fn chars_after(chars: impl Into<String>) -> Validator {
    let chars = chars.into();
    Arc::new(move |m: &Match| after(&chars, m))
}

/// Accepts matches both preceded and followed by one of `chars`.
pub fn chars_surround(chars: impl Into<String>) -> Validator {
    let chars = chars.into();
    Arc::new(move |m: &Match| before(&chars, m) && after(&chars, m))
}

/// Accepts matches every validator accepts.
pub fn all_of(validators: Vec<Validator>) -> Validator {
    Arc::new(move |m: &Match| validators.iter().all(|validator| validator(m)))
}

fn before(chars: &str, m: &Match) -> bool {
    char_before(m.input(), m.start).is_none_or(|c| chars.contains(c))
}

fn after(chars: &str, m: &Match) -> bool {
    char_at(m.input(), m.end).is_none_or(|c| chars.contains(c))
}
