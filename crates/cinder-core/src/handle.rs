//! Opaque paste handles and share links.
//!
//! Stores issue handles as the URL-safe, padded base64 of the envelope's
//! SHA-256 digest. Padding means every such handle ends in `=`, which must be
//! percent-escaped inside a link.
//!
//! ```text
//! https://paste.example/read/q1rC...Zg%3D
//! └──────── origin ───────┘└────┘└── escaped handle ──┘
//!                        READ_PATH
//! ```

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE};
use sha2::{Digest, Sha256};

/// Path segment between the origin and the handle in a share link.
pub const READ_PATH: &str = "/read/";

/// Length of a content-addressed handle (base64 of 32 bytes, padded).
pub const HANDLE_LEN: usize = 44;

/// Server-issued identifier of a stored paste.
///
/// Opaque to everything except the store that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(String);

impl Handle {
    /// Wrap an issued handle.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Content-addressed handle for an envelope.
    ///
    /// Equal envelopes get equal handles. Two uploads of the same unencrypted
    /// content therefore share one stored entry.
    pub fn for_envelope(envelope: &[u8]) -> Self {
        Self(URL_SAFE.encode(Sha256::digest(envelope)))
    }

    /// Handle text, unescaped.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shareable link: `origin + "/read/" + escaped handle`.
    ///
    /// A trailing slash on `origin` is dropped so links never contain `//`.
    pub fn share_link(&self, origin: &str) -> String {
        let origin = origin.trim_end_matches('/');
        let mut link = String::with_capacity(origin.len() + READ_PATH.len() + self.0.len() + 8);
        link.push_str(origin);
        link.push_str(READ_PATH);
        percent_escape_into(&self.0, &mut link);
        link
    }

    /// Recover a handle from a share link or a bare (possibly escaped) handle.
    ///
    /// Anything after `?` or `#` is ignored. Returns `None` for an empty
    /// handle or a broken escape sequence.
    pub fn from_link(link: &str) -> Option<Self> {
        let link = link.trim();
        let tail = match link.rfind(READ_PATH) {
            Some(at) => &link[at + READ_PATH.len()..],
            None => link,
        };
        let tail = tail.split(['?', '#']).next().unwrap_or_default();

        let handle = percent_unescape(tail)?;
        if handle.is_empty() || handle.contains('/') {
            return None;
        }
        Some(Self(handle))
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Handle {
    fn from(handle: &str) -> Self {
        Self::new(handle)
    }
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~')
}

fn percent_escape_into(raw: &str, out: &mut String) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    for &b in raw.as_bytes() {
        if is_unreserved(b) {
            out.push(char::from(b));
        } else {
            out.push('%');
            out.push(char::from(HEX[usize::from(b >> 4)]));
            out.push(char::from(HEX[usize::from(b & 0x0F)]));
        }
    }
}

fn percent_unescape(escaped: &str) -> Option<String> {
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = hex_value(*bytes.get(i + 1)?)?;
            let lo = hex_value(*bytes.get(i + 2)?)?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).ok()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
