//! Fuzz target for frame decoding
//!
//! Arbitrary bytes must decode or fail with an error, never panic. A frame
//! that decodes must re-encode to the same bytes.

#![no_main]

use cinder_proto::decode;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = decode(data) {
        assert_eq!(content.encode(), data, "decode/encode mismatch");
    }
});
