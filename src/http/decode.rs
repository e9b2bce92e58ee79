//! Content-Encoding decoding
//!
//! Requests advertise gzip and deflate. Bodies are decoded here rather
//! than by the client so the original `content-encoding` header stays
//! visible to the assertions.

use std::io::{self, Read};

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};

/// Encodings advertised in `Accept-Encoding`
pub const ACCEPTED_ENCODINGS: &str = "gzip, deflate";

/// Decode `body` according to a `content-encoding` header value
///
/// Unknown encodings and `identity` are returned unchanged. Stacked
/// encodings are undone in reverse order of application.
pub fn decode_body(content_encoding: Option<&str>, body: &[u8]) -> io::Result<Vec<u8>> {
    let Some(header) = content_encoding else {
        return Ok(body.to_vec());
    };

    let mut data = body.to_vec();
    for coding in header.split(',').map(str::trim).rev() {
        data = match coding.to_ascii_lowercase().as_str() {
            "gzip" | "x-gzip" => read_all(GzDecoder::new(data.as_slice()))?,
            // Servers disagree on whether deflate means zlib-wrapped or raw
            "deflate" => read_all(ZlibDecoder::new(data.as_slice()))
                .or_else(|_| read_all(DeflateDecoder::new(data.as_slice())))?,
            _ => data,
        };
    }
    Ok(data)
}

fn read_all(mut reader: impl Read) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn test_no_header_passes_through() {
        assert_eq!(decode_body(None, b"plain").unwrap(), b"plain");
        assert_eq!(decode_body(Some("identity"), b"plain").unwrap(), b"plain");
    }

    #[test]
    fn test_gzip() {
        let decoded = decode_body(Some("gzip"), &gzip(b"Welcome, user")).unwrap();
        assert_eq!(decoded, b"Welcome, user");
    }

    #[test]
    fn test_deflate_accepts_zlib_and_raw() {
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
        zlib.write_all(b"zlib body").unwrap();
        let zlib = zlib.finish().unwrap();
        assert_eq!(decode_body(Some("deflate"), &zlib).unwrap(), b"zlib body");

        let mut raw = DeflateEncoder::new(Vec::new(), Compression::default());
        raw.write_all(b"raw body").unwrap();
        let raw = raw.finish().unwrap();
        assert_eq!(decode_body(Some("Deflate"), &raw).unwrap(), b"raw body");
    }

    #[test]
    fn test_corrupt_gzip_is_an_error() {
        assert!(decode_body(Some("gzip"), b"definitely not gzip").is_err());
    }
}
