// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for archive entities.

pub mod chats;
pub mod messages;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

/// Convert a stored unix-millisecond column back into a UTC timestamp.
pub(crate) fn millis_to_datetime(column: usize, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            Type::Integer,
            format!("timestamp out of range: {millis}").into(),
        )
    })
}
