// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! QR code rendering

use crate::error::{ServerError, ServerResult};
use base64::Engine;
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;

/// PNG of `text` encoded as a QR code, at least `size` pixels on each side
pub fn render_png(text: &str, size: u32) -> ServerResult<Vec<u8>> {
    let code = QrCode::new(text.as_bytes())
        .map_err(|e| ServerError::Internal(format!("QR encoding failed: {e}")))?;
    let image = code.render::<Luma<u8>>().min_dimensions(size, size).build();

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ServerError::Internal(format!("PNG encoding failed: {e}")))?;
    Ok(png)
}

/// Base64 of [`render_png`], as embedded in registration responses
pub fn render_base64(text: &str, size: u32) -> ServerResult<String> {
    Ok(base64::engine::general_purpose::STANDARD.encode(render_png(text, size)?))
}
