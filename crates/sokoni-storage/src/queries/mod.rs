// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed CRUD operations, one module per table group.

pub mod agents;
pub mod bookings;
pub mod catalog;
pub mod conversations;
pub mod messages;
pub mod orders;
pub mod profiles;

use std::str::FromStr;

/// Parse a text column into a typed enum, reporting failures as
/// conversion errors on the source column.
pub(crate) fn parse_col<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
