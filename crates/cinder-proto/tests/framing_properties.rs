//! Property-based tests for content framing
//!
//! Verifies that framing is correct for ALL inputs, not just examples: short
//! titles round-trip exactly, long titles are cut to 255 bytes, and decoding
//! arbitrary bytes never panics.

use cinder_proto::{FramingError, MAX_TITLE_LEN, decode, encode};
use proptest::prelude::*;

/// Titles whose UTF-8 encoding fits behind the length byte.
fn short_title() -> impl Strategy<Value = String> {
    ".{0,64}".prop_filter("fits in 255 bytes", |t| t.len() <= MAX_TITLE_LEN)
}

proptest! {
    #[test]
    fn prop_round_trip_short_titles(
        title in short_title(),
        body in prop::collection::vec(any::<u8>(), 0..2048),
    ) {
        let decoded = decode(&encode(&title, &body)).expect("decode should succeed");

        // PROPERTY: Round-trip must be identity
        prop_assert_eq!(decoded.title(), title.as_str());
        prop_assert_eq!(decoded.body, body);
    }

    #[test]
    fn prop_long_titles_truncated_to_max(
        title in "[a-zA-Z0-9]{256,600}",
        body in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let framed = encode(&title, &body);
        let decoded = decode(&framed).expect("decode should succeed");

        // PROPERTY: Exactly the first 255 bytes survive
        prop_assert_eq!(framed[0] as usize, MAX_TITLE_LEN);
        prop_assert_eq!(&decoded.title[..], &title.as_bytes()[..MAX_TITLE_LEN]);
        prop_assert_eq!(decoded.body, body);
    }

    #[test]
    fn prop_encoded_len_is_prefix_plus_parts(
        title in ".{0,300}",
        body in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let framed = encode(&title, &body);
        prop_assert_eq!(framed.len(), 1 + title.len().min(MAX_TITLE_LEN) + body.len());
    }

    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        match decode(&bytes) {
            Ok(content) => {
                // PROPERTY: A successful decode accounts for every byte
                prop_assert_eq!(1 + content.title.len() + content.body.len(), bytes.len());
            },
            Err(FramingError::MalformedFraming { required, actual, .. }) => {
                prop_assert!(actual < required);
                prop_assert_eq!(actual, bytes.len());
            },
        }
    }
}
