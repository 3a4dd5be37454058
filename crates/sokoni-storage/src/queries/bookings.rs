// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service booking operations.

use rusqlite::params;
use sokoni_core::{Booking, SokoniError};

use crate::database::{map_tr_err, Database};

/// Insert one booking.
pub async fn insert_booking(db: &Database, booking: &Booking) -> Result<(), SokoniError> {
    let booking = booking.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bookings
                     (id, user_id, agent_id, conversation_id, service_id, service_name, price,
                      customer_phone, customer_name, preferred_date, preferred_time, location,
                      notes, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    booking.id,
                    booking.user_id,
                    booking.agent_id,
                    booking.conversation_id,
                    booking.service_id,
                    booking.service_name,
                    booking.price,
                    booking.customer_phone,
                    booking.customer_name,
                    booking.preferred_date,
                    booking.preferred_time,
                    booking.location,
                    booking.notes,
                    booking.status,
                    booking.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
