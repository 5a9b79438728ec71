#[cfg(test)]
mod tests {
    use crate::pipeline::{dedup_trades, normalize_fills, parse_fill_lines};

    /// Parse → normalize → dedup over a combined two-file batch: the same
    /// fill appearing in both files survives as one trade.
    #[test]
    fn test_pipeline_chain_collapses_cross_file_duplicate() {
        let file_a =
            b"{\"user\":\"0xabc\",\"coin\":\"BTC\",\"px\":\"45000.0\",\"sz\":\"1.5\",\"side\":\"B\",\"time\":1704110400000,\"oid\":1,\"fee\":\"1.0\"}\n";
        let file_b =
            b"{\"user\":\"0xabc\",\"coin\":\"BTC\",\"px\":\"45000.0\",\"sz\":\"1.5\",\"side\":\"B\",\"time\":1704110400000,\"oid\":1,\"fee\":\"1.0\"}\n\
              {\"user\":\"0xdef\",\"coin\":\"ETH\",\"px\":\"3000.0\",\"sz\":\"2.0\",\"side\":\"A\",\"time\":1704110401000,\"oid\":2,\"fee\":\"0.5\"}\n";

        let mut raws = parse_fill_lines("block/100/a.json", file_a).unwrap();
        raws.extend(parse_fill_lines("block/100/b.json", file_b).unwrap());
        assert_eq!(raws.len(), 3);

        let batch = normalize_fills(raws);
        assert_eq!(batch.dropped, 0);

        let unique = dedup_trades(batch.trades);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].wallet_address, "0xabc");
        assert_eq!(unique[1].wallet_address, "0xdef");
    }

    /// Garbage rows in a batch drop quietly while the rest normalizes.
    #[test]
    fn test_pipeline_chain_drops_partial_garbage() {
        let raw =
            b"{\"user\":\"0xabc\",\"coin\":\"BTC\",\"px\":\"45000.0\",\"sz\":\"1.5\",\"side\":\"B\",\"time\":1704110400000,\"oid\":1}\n\
              {\"coin\":\"BTC\",\"px\":\"45000.0\",\"sz\":\"1.5\",\"side\":\"B\",\"time\":1704110400000,\"oid\":2}\n\
              {\"user\":\"0xdef\",\"coin\":\"ETH\",\"px\":\"oops\",\"sz\":\"2.0\",\"side\":\"A\",\"time\":1704110401000,\"oid\":3}\n";

        let raws = parse_fill_lines("block/100/a.json", raw).unwrap();
        let batch = normalize_fills(raws);

        assert_eq!(batch.trades.len(), 1);
        assert_eq!(batch.dropped, 2);
        assert_eq!(batch.trades[0].wallet_address, "0xabc");
    }
}
