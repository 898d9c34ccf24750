//! Decrypted content as the reader sees it.
//!
//! A [`Presented`] value is the only place plaintext lives after a successful
//! decrypt. Title and body are wiped when it is dropped.

use std::{borrow::Cow, fmt};

use chrono::{DateTime, Utc};
use cinder_core::readable_bytes;
use cinder_proto::FramedContent;
use zeroize::Zeroizing;

/// How content should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Hand-written text: `text/plain` with a blank title.
    Message,
    /// Any `image*` content type.
    Image,
    /// Everything else; offered as a download.
    File,
}

impl ContentKind {
    /// Classify by content type and title.
    ///
    /// Titled text counts as an uploaded file, not a message.
    pub fn classify(content_type: &str, title: &str) -> Self {
        if content_type == "text/plain" && title.trim().is_empty() {
            Self::Message
        } else if content_type.starts_with("image") {
            Self::Image
        } else {
            Self::File
        }
    }
}

/// Plaintext of a revealed paste.
pub struct Presented {
    title: Zeroizing<String>,
    body: Zeroizing<Vec<u8>>,
    content_type: String,
    kind: ContentKind,
    size: u64,
}

impl Presented {
    /// Take ownership of decoded content.
    pub fn new(content_type: impl Into<String>, content: FramedContent) -> Self {
        let content_type = content_type.into();
        let size = content.encoded_len() as u64;

        let FramedContent { title, body } = content;
        let title_bytes = Zeroizing::new(title);
        let title = Zeroizing::new(String::from_utf8_lossy(&title_bytes).into_owned());
        let kind = ContentKind::classify(&content_type, &title);

        Self { title, body: Zeroizing::new(body), content_type, kind, size }
    }

    /// Title, possibly empty.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Content type chosen by the writer.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Display classification.
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Size of the framed content in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// [`Presented::size`] for humans.
    pub fn readable_size(&self) -> String {
        readable_bytes(self.size)
    }

    /// Message text for [`ContentKind::Message`] content.
    ///
    /// Invalid UTF-8 is replaced, never rejected.
    pub fn message(&self) -> Option<Cow<'_, str>> {
        match self.kind {
            ContentKind::Message => Some(String::from_utf8_lossy(&self.body)),
            ContentKind::Image | ContentKind::File => None,
        }
    }

    /// File name to save the body under.
    ///
    /// The title when it is not empty, otherwise `cinder-<date>.<ext>` with
    /// the UTC date of `now_secs` and an extension guessed from the content
    /// type.
    pub fn download_name(&self, now_secs: u64) -> String {
        if !self.title.is_empty() {
            return self.title.as_str().to_owned();
        }

        let date = i64::try_from(now_secs)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_default();
        format!("cinder-{}.{}", date.format("%Y-%m-%d"), extension_for(&self.content_type))
    }
}

impl fmt::Debug for Presented {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presented")
            .field("content_type", &self.content_type)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Types whose registered extensions do not start with the usual one.
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("text/plain", "txt"),
    ("audio/mpeg", "mp3"),
    ("text/javascript", "js"),
    ("application/javascript", "js"),
];

/// File extension for a content type. Parameters after `;` are ignored.
///
/// Among the extensions registered for the type, the one matching the
/// subtype wins (`image/jpeg` is `jpeg`, not `jfif`). Unknown types fall back
/// to `bin`.
pub fn extension_for(content_type: &str) -> &'static str {
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();

    if let Some(&(_, ext)) = PREFERRED_EXTENSIONS.iter().find(|(ty, _)| *ty == essence) {
        return ext;
    }
    let Some(candidates) = mime_guess::get_mime_extensions_str(&essence) else {
        return "bin";
    };

    let subtype = essence.split_once('/').map_or("", |(_, sub)| sub);
    let subtype = subtype.split('+').next().unwrap_or(subtype);
    let subtype = subtype.strip_prefix("x-").unwrap_or(subtype);

    candidates
        .iter()
        .copied()
        .find(|ext| *ext == subtype)
        .or_else(|| candidates.first().copied())
        .unwrap_or("bin")
}
