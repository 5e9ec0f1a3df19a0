//! Content type detection from file bytes.

use cloudbox_core::constants::{EMPTY_MIME, OCTET_STREAM_MIME, TEXT_PLAIN_MIME};

/// Detect the MIME type of `data` from its content, ignoring any declared type.
///
/// Magic-number signatures win. Signature-less content is `text/plain` when it
/// reads as text (UTF-8, BOM-prefixed UTF-16 or a single-byte encoding such as
/// Latin-1) and `application/octet-stream` otherwise.
pub fn sniff_mime_type(data: &[u8]) -> String {
    if data.is_empty() {
        return EMPTY_MIME.to_string();
    }

    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    if is_utf16_text(data) || is_single_byte_text(data) {
        TEXT_PLAIN_MIME.to_string()
    } else {
        OCTET_STREAM_MIME.to_string()
    }
}

fn is_utf16_text(data: &[u8]) -> bool {
    let (body, little_endian) = match data {
        [0xFF, 0xFE, rest @ ..] => (rest, true),
        [0xFE, 0xFF, rest @ ..] => (rest, false),
        _ => return false,
    };
    if body.len() % 2 != 0 {
        return false;
    }

    let units = body.chunks_exact(2).map(|pair| {
        if little_endian {
            u16::from_le_bytes([pair[0], pair[1]])
        } else {
            u16::from_be_bytes([pair[0], pair[1]])
        }
    });
    char::decode_utf16(units).all(|c| matches!(c, Ok(c) if !is_binary_control(c)))
}

/// UTF-8, or any 8-bit encoding whose high bytes are printable, without
/// binary control characters.
fn is_single_byte_text(data: &[u8]) -> bool {
    match std::str::from_utf8(data) {
        Ok(text) => !text.chars().any(is_binary_control),
        Err(_) => !data.iter().any(|&b| is_binary_control(char::from(b))),
    }
}

/// C0 controls other than the whitespace and escape characters found in text.
fn is_binary_control(c: char) -> bool {
    c < ' ' && !matches!(c, '\t' | '\n' | '\r' | '\x0C' | '\x1B')
}
