// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Identifier validation shared by the string-keyed id newtypes.
//!
//! Agent, team, role and step ids travel inside the message address grammar
//! (`role:<id>`, `team:<id>`), so the allowed charset deliberately excludes
//! the `:` separator and whitespace.

use thiserror::Error;

pub(crate) const MAX_IDENTIFIER_LEN: usize = 64;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidIdentifier {
    #[error("{what} must not be empty")]
    Empty { what: &'static str },

    #[error("{what} '{value}' exceeds {max} characters")]
    TooLong {
        what: &'static str,
        value: String,
        max: usize,
    },

    #[error("{what} '{value}' must start with an ASCII letter or digit")]
    BadLeadingChar { what: &'static str, value: String },

    #[error("{what} '{value}' may only contain ASCII letters, digits, '-', '_' and '.'")]
    BadChar { what: &'static str, value: String },
}

pub(crate) fn validate_identifier(
    what: &'static str,
    value: &str,
) -> Result<(), InvalidIdentifier> {
    if value.is_empty() {
        return Err(InvalidIdentifier::Empty { what });
    }

    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(InvalidIdentifier::TooLong {
            what,
            value: value.to_string(),
            max: MAX_IDENTIFIER_LEN,
        });
    }

    // Must start with alphanumeric
    if !value
        .chars()
        .next()
        .map(|c| c.is_ascii_alphanumeric())
        .unwrap_or(false)
    {
        return Err(InvalidIdentifier::BadLeadingChar {
            what,
            value: value.to_string(),
        });
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(InvalidIdentifier::BadChar {
            what,
            value: value.to_string(),
        });
    }

    Ok(())
}
