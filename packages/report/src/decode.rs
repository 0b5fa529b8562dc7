//! Response body decoding.
//!
//! `reqwest` is built without automatic decompression, so a body sent with
//! `Content-Encoding: gzip` arrives still compressed and is inflated here.

use std::io::Read as _;

use crate::ReportError;

/// Decodes a raw response body into text.
///
/// A `gzip` content encoding (case-insensitive) is inflated fully in memory
/// first. No header, `identity`, or an unrecognized encoding decode the raw
/// bytes directly.
///
/// # Errors
///
/// Returns [`ReportError::Decompress`] if the gzip stream is corrupt, or
/// [`ReportError::Utf8`] if the result is not valid UTF-8.
pub fn decode_body(bytes: &[u8], content_encoding: Option<&str>) -> Result<String, ReportError> {
    let encoding = content_encoding.map(str::trim).filter(|e| !e.is_empty());

    let text_bytes = match encoding {
        Some(e) if e.eq_ignore_ascii_case("gzip") => gunzip(bytes)?,
        Some(other) if !other.eq_ignore_ascii_case("identity") => {
            log::warn!("Unsupported content encoding '{other}', decoding body as-is");
            bytes.to_vec()
        }
        _ => bytes.to_vec(),
    };

    Ok(String::from_utf8(text_bytes)?)
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, ReportError> {
    let mut decoder = flate2::read::GzDecoder::new(bytes);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    log::debug!(
        "Decompressed {} bytes to {} bytes",
        bytes.len(),
        decompressed.len()
    );
    Ok(decompressed)
}
