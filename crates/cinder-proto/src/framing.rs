//! Title-length-prefixed framing of `(title, body)` pairs.

use std::borrow::Cow;

use bytes::BufMut;

use crate::errors::{FramingError, Result};

/// Longest title that fits behind the single length byte.
pub const MAX_TITLE_LEN: usize = u8::MAX as usize;

/// A decoded `(title, body)` pair.
///
/// The title is kept as raw bytes: truncation at encode time may split a
/// multi-byte UTF-8 sequence, and the decoder must hand back exactly the bytes
/// it was given. Use [`FramedContent::title`] for display.
///
/// # Invariants
///
/// - `title.len() <= MAX_TITLE_LEN` for values produced by [`decode`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FramedContent {
    /// Title bytes, nominally UTF-8.
    pub title: Vec<u8>,
    /// Body bytes, opaque.
    pub body: Vec<u8>,
}

impl FramedContent {
    /// Build a pair from a string title, truncating it to [`MAX_TITLE_LEN`]
    /// bytes.
    pub fn new(title: &str, body: impl Into<Vec<u8>>) -> Self {
        Self { title: truncate_title(title).to_vec(), body: body.into() }
    }

    /// Title as UTF-8, invalid sequences replaced with U+FFFD.
    pub fn title(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.title)
    }

    /// Number of bytes [`FramedContent::encode`] will produce.
    pub fn encoded_len(&self) -> usize {
        1 + self.title.len().min(MAX_TITLE_LEN) + self.body.len()
    }

    /// Serialize into the wire layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        write_frame(&self.title, &self.body, &mut out);
        out
    }

    /// Parse the wire layout. See [`decode`].
    pub fn decode(framed: &[u8]) -> Result<Self> {
        decode(framed)
    }
}

/// Frame a title and body.
///
/// The title is UTF-8 encoded and cut to its first [`MAX_TITLE_LEN`] bytes.
/// Never fails.
pub fn encode(title: &str, body: &[u8]) -> Vec<u8> {
    let title = truncate_title(title);
    let mut out = Vec::with_capacity(1 + title.len() + body.len());
    write_frame(title, body, &mut out);
    out
}

/// Frame a title and body directly into `dst`.
pub fn encode_into(title: &str, body: &[u8], dst: &mut impl BufMut) {
    write_frame(truncate_title(title), body, dst);
}

/// Split framed bytes back into title and body.
///
/// # Errors
///
/// - `FramingError::MalformedFraming` if `framed` holds fewer than `1 + n`
///   bytes, where `n` is the leading length byte (an empty input has no length
///   byte at all)
pub fn decode(framed: &[u8]) -> Result<FramedContent> {
    let Some((&len_byte, rest)) = framed.split_first() else {
        return Err(FramingError::MalformedFraming { title_len: 0, required: 1, actual: 0 });
    };

    let title_len = usize::from(len_byte);
    if rest.len() < title_len {
        return Err(FramingError::MalformedFraming {
            title_len,
            required: 1 + title_len,
            actual: framed.len(),
        });
    }

    let (title, body) = rest.split_at(title_len);

    debug_assert!(title.len() <= MAX_TITLE_LEN);

    Ok(FramedContent { title: title.to_vec(), body: body.to_vec() })
}

fn truncate_title(title: &str) -> &[u8] {
    let bytes = title.as_bytes();
    &bytes[..bytes.len().min(MAX_TITLE_LEN)]
}

fn write_frame(title: &[u8], body: &[u8], dst: &mut impl BufMut) {
    let title = &title[..title.len().min(MAX_TITLE_LEN)];

    // INVARIANT: title was cut to MAX_TITLE_LEN (u8::MAX) above
    dst.put_u8(title.len() as u8);
    dst.put_slice(title);
    dst.put_slice(body);
}
