// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number normalization shared by the session layer and the
//! tool executor.

use tracing::debug;

/// Normalize a phone number to bare digits with country code.
///
/// Strips a leading `+` or `00` international prefix, then spaces,
/// dashes, and parentheses. Local-looking numbers (leading zero) pass
/// through unchanged; the AI prompt instructs collecting the country
/// code, so they are only logged here.
pub fn normalize_phone(phone: &str) -> String {
    let mut normalized = phone.trim().to_string();
    if let Some(rest) = normalized.strip_prefix('+') {
        normalized = rest.to_string();
    } else if let Some(rest) = normalized.strip_prefix("00") {
        normalized = rest.to_string();
    }
    normalized.retain(|c| !matches!(c, ' ' | '-' | '(' | ')'));

    if normalized.len() >= 9
        && normalized.len() <= 11
        && normalized.starts_with('0')
        && normalized.chars().all(|c| c.is_ascii_digit())
    {
        debug!(phone = %normalized, "phone number appears local, missing country code");
    }
    normalized
}
