//! Newline-delimited JSON fill parsing.

use super::error::IngestError;

/// One fill as published by the node, prior to normalization.
///
/// Kept loosely typed: the feed has grown fields over time (`startPosition`,
/// `dir`, `closedPnl`, `crossed`, `tid`, `feeToken`, ...) and the normalizer
/// only reads the ones it maps.
pub type RawFill = serde_json::Map<String, serde_json::Value>;

/// Parse one object's content into fill records.
///
/// Blank lines are skipped. A line that is not valid JSON fails the whole
/// object rather than being skipped, so structurally corrupt files cannot
/// silently lose fills.
pub fn parse_fill_lines(key: &str, raw: &[u8]) -> Result<Vec<RawFill>, IngestError> {
    let text = std::str::from_utf8(raw).map_err(|e| IngestError::Parse {
        key: key.to_string(),
        line: 0,
        message: format!("invalid utf-8: {}", e),
    })?;

    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: RawFill = serde_json::from_str(line).map_err(|e| IngestError::Parse {
            key: key.to_string(),
            line: index + 1,
            message: e.to_string(),
        })?;
        records.push(record);
    }

    log::debug!("Parsed {} fill records from {}", records.len(), key);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_record_per_line() {
        let raw = b"{\"coin\":\"BTC\",\"px\":\"45000.0\"}\n{\"coin\":\"ETH\",\"px\":\"3000.0\"}\n";
        let records = parse_fill_lines("fills.json", raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["coin"], "BTC");
        assert_eq!(records[1]["px"], "3000.0");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let raw = b"{\"coin\":\"BTC\"}\n\n   \n{\"coin\":\"ETH\"}\n";
        let records = parse_fill_lines("fills.json", raw).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn empty_content_yields_no_records() {
        let records = parse_fill_lines("fills.json", b"").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn malformed_line_fails_the_whole_object() {
        let raw = b"{\"coin\":\"BTC\"}\n{not json\n{\"coin\":\"ETH\"}\n";
        let err = parse_fill_lines("fills.json", raw).unwrap_err();
        match err {
            IngestError::Parse { key, line, .. } => {
                assert_eq!(key, "fills.json");
                assert_eq!(line, 2);
            }
            other => panic!("expected parse error, got {}", other),
        }
    }

    #[test]
    fn trailing_malformed_line_fails_the_whole_object() {
        let raw = b"{\"coin\":\"BTC\"}\n{\"coin\":\"ETH\"}\n{\"coin\":";
        let err = parse_fill_lines("fills.json", raw).unwrap_err();
        assert!(matches!(err, IngestError::Parse { line: 3, .. }));
    }

    #[test]
    fn invalid_utf8_fails_the_whole_object() {
        let raw = [0xff, 0xfe, 0x7b, 0x7d];
        let err = parse_fill_lines("fills.json", &raw).unwrap_err();
        assert!(matches!(err, IngestError::Parse { line: 0, .. }));
    }
}
