//! Content-type detection for stored registration documents.

/// Guesses an image MIME type from magic bytes.
///
/// Uploads are not checked on the way in, so anything unrecognised (or too
/// short to tell) is served as JPEG.
pub fn sniff_content_type(data: &[u8]) -> &'static str {
    if data.len() <= 4 {
        return "image/jpeg";
    }
    match data {
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0xFF, 0xD8, ..] => "image/jpeg",
        [0x47, 0x49, 0x46, ..] => "image/gif",
        [0x42, 0x4D, ..] => "image/bmp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_png() {
        assert_eq!(sniff_content_type(b"\x89PNG\r\n\x1a\n"), "image/png");
    }

    #[test]
    fn detects_gif_and_bmp() {
        assert_eq!(sniff_content_type(b"GIF89a..."), "image/gif");
        assert_eq!(sniff_content_type(b"BM\x00\x00\x00\x00"), "image/bmp");
    }

    #[test]
    fn detects_jpeg() {
        assert_eq!(sniff_content_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), "image/jpeg");
    }

    #[test]
    fn unknown_or_short_defaults_to_jpeg() {
        assert_eq!(sniff_content_type(b"%PDF-1.7"), "image/jpeg");
        assert_eq!(sniff_content_type(b"\x89PNG"), "image/jpeg");
        assert_eq!(sniff_content_type(&[]), "image/jpeg");
    }
}
