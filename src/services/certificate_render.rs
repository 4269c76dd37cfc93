use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use png::{BitDepth, ColorType, Encoder};
use qrcode::{Color, EcLevel, QrCode};
use thiserror::Error;

const QR_MODULE_PX: usize = 8;
const QR_QUIET_ZONE: usize = 4;

#[derive(Debug, Error)]
pub(crate) enum RenderError {
    #[error("qr encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),
    #[error("png encoding failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error("template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// Values substituted into a template's `{{placeholder}}` slots.
#[derive(Debug, Clone)]
pub(crate) struct CertificateFields<'a> {
    pub(crate) holder_name: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) certificate_number: &'a str,
    pub(crate) issue_date: &'a str,
    pub(crate) verification_url: &'a str,
}

pub(crate) fn qr_payload(certificate_id: &str, holder_name: &str, issued: &str) -> String {
    format!("Certificate ID: {certificate_id}\nUser: {holder_name}\nIssued: {issued}")
}

/// Grayscale PNG of `data` with a quiet zone around the symbol.
pub(crate) fn qr_png(data: &str) -> Result<Vec<u8>, RenderError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)?;
    let modules = code.to_colors();
    let qr_width = code.width();

    let side_modules = qr_width + QR_QUIET_ZONE * 2;
    let side = side_modules * QR_MODULE_PX;
    let mut pixels = vec![255u8; side * side];

    for y in 0..side {
        let my = y / QR_MODULE_PX;
        if my < QR_QUIET_ZONE || my >= QR_QUIET_ZONE + qr_width {
            continue;
        }
        for x in 0..side {
            let mx = x / QR_MODULE_PX;
            if mx < QR_QUIET_ZONE || mx >= QR_QUIET_ZONE + qr_width {
                continue;
            }
            let idx = (my - QR_QUIET_ZONE) * qr_width + (mx - QR_QUIET_ZONE);
            if modules.get(idx) == Some(&Color::Dark) {
                pixels[y * side + x] = 0;
            }
        }
    }

    let mut buffer = Vec::new();
    {
        let mut encoder = Encoder::new(&mut buffer, side as u32, side as u32);
        encoder.set_color(ColorType::Grayscale);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&pixels)?;
    }

    Ok(buffer)
}

pub(crate) fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// Fills the SVG template. `{{qr_code}}` is mandatory so every certificate
/// can be verified offline.
pub(crate) fn render_svg(
    layout_svg: &str,
    fields: &CertificateFields<'_>,
    qr_png: &[u8],
) -> Result<Vec<u8>, RenderError> {
    if !layout_svg.contains("{{qr_code}}") {
        return Err(RenderError::MissingPlaceholder("{{qr_code}}"));
    }

    let rendered = layout_svg
        .replace("{{holder_name}}", &xml_escape(fields.holder_name))
        .replace("{{title}}", &xml_escape(fields.title))
        .replace("{{description}}", &xml_escape(fields.description))
        .replace("{{certificate_number}}", &xml_escape(fields.certificate_number))
        .replace("{{issue_date}}", &xml_escape(fields.issue_date))
        .replace("{{verification_url}}", &xml_escape(fields.verification_url))
        .replace("{{qr_code}}", &png_data_uri(qr_png));

    Ok(rendered.into_bytes())
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
