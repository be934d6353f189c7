//! Net-string (length-prefixed) record framing (spec §4.4, §6).
//!
//! `<decimal-length> ':' <payload-bytes> ','`. Chosen over JSON-lines
//! because a record's JSON payload can itself contain newlines.

/// Appends one framed record to `out`.
pub fn encode_record(out: &mut Vec<u8>, payload: &[u8]) {
    out.extend_from_slice(payload.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(payload);
    out.push(b',');
}

/// Iterates the framed records in a byte buffer.
///
/// Stops at the first malformed or truncated record rather than erroring --
/// a snapshot file truncated mid-write (e.g. by a crash between `write` and
/// `fsync`) should yield every complete record that came before the cut,
/// not lose the whole file.
pub struct NetStringReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> NetStringReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }
}

impl<'a> Iterator for NetStringReader<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let rest = &self.buf[self.pos..];
        let colon = rest.iter().position(|&b| b == b':')?;
        let len: usize = std::str::from_utf8(&rest[..colon]).ok()?.parse().ok()?;

        let payload_start = colon + 1;
        let payload_end = payload_start.checked_add(len)?;
        if payload_end >= rest.len() || rest[payload_end] != b',' {
            return None;
        }

        self.pos += payload_end + 1;
        Some(&rest[payload_start..payload_end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_multiple_records() {
        let mut buf = Vec::new();
        encode_record(&mut buf, b"hello");
        encode_record(&mut buf, b"{\"a\":1}");
        encode_record(&mut buf, b"");

        let records: Vec<&[u8]> = NetStringReader::new(&buf).collect();
        assert_eq!(records, vec![b"hello".as_slice(), b"{\"a\":1}", b""]);
    }

    #[test]
    fn tolerates_truncation_at_a_record_boundary() {
        let mut buf = Vec::new();
        encode_record(&mut buf, b"complete");
        buf.extend_from_slice(b"5:part"); // truncated: missing trailing bytes and comma

        let records: Vec<&[u8]> = NetStringReader::new(&buf).collect();
        assert_eq!(records, vec![b"complete".as_slice()]);
    }

    #[test]
    fn empty_buffer_yields_no_records() {
        assert!(NetStringReader::new(&[]).next().is_none());
    }

    proptest::proptest! {
        // Any sequence of arbitrary byte payloads, once framed back to back,
        // reads back as the same sequence (spec §8's net-string round-trip
        // law) -- including payloads containing ':' and ',' themselves,
        // since the length prefix makes the framing independent of content.
        #[test]
        fn encoding_then_reading_roundtrips_any_payload_sequence(payloads in proptest::collection::vec(proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64), 0..16)) {
            let mut buf = Vec::new();
            for payload in &payloads {
                encode_record(&mut buf, payload);
            }

            let records: Vec<&[u8]> = NetStringReader::new(&buf).collect();
            let expected: Vec<&[u8]> = payloads.iter().map(|p| p.as_slice()).collect();
            prop_assert_eq!(records, expected);
        }
    }
}
