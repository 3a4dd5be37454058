// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pairing-challenge rendering.

use qrcode::render::unicode;
use qrcode::QrCode;

use sokoni_core::SokoniError;

/// Renders a pairing challenge as a scannable unicode block QR code.
pub fn render_qr(data: &str) -> Result<String, SokoniError> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| SokoniError::Internal(format!("failed to encode pairing QR: {e}")))?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .quiet_zone(true)
        .build())
}
