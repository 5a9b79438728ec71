//! Per-object decompression, selected by key suffix.

use std::io::Read;

/// Decompress object content based on its key's file extension.
///
/// `.gz` is a gzip stream, `.lz4` an LZ4 frame; any other suffix means the
/// content is already plain newline-delimited JSON and passes through
/// untouched.
pub fn decompress_for_key(key: &str, raw: Vec<u8>) -> Result<Vec<u8>, String> {
    if key.ends_with(".gz") {
        let mut decoder = flate2::read::GzDecoder::new(raw.as_slice());
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| format!("gzip: {}", e))?;
        Ok(out)
    } else if key.ends_with(".lz4") {
        let mut decoder = lz4_flex::frame::FrameDecoder::new(raw.as_slice());
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| format!("lz4: {}", e))?;
        Ok(out)
    } else {
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn lz4(data: &[u8]) -> Vec<u8> {
        let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn gz_suffix_decompresses_gzip() {
        let payload = b"{\"coin\":\"BTC\"}\n";
        let out = decompress_for_key("node_fills_by_block/100/fills.gz", gzip(payload)).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn lz4_suffix_decompresses_frame() {
        let payload = b"{\"coin\":\"ETH\"}\n";
        let out = decompress_for_key("node_fills_by_block/100/fills.lz4", lz4(payload)).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn other_suffix_passes_through() {
        let payload = b"{\"coin\":\"SOL\"}\n".to_vec();
        let out = decompress_for_key("node_fills_by_block/100/fills.json", payload.clone()).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn corrupt_gzip_is_an_error() {
        let err = decompress_for_key("fills.gz", b"definitely not gzip".to_vec());
        assert!(err.is_err());
    }

    #[test]
    fn corrupt_lz4_is_an_error() {
        let err = decompress_for_key("fills.lz4", b"definitely not lz4".to_vec());
        assert!(err.is_err());
    }
}
