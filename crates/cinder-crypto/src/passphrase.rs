//! Passphrase wrapper that never prints and wipes itself on drop.

use std::fmt;

use zeroize::Zeroize;

/// A user-supplied passphrase.
///
/// `Debug` is redacted and the backing buffer is zeroized on drop, so a
/// passphrase can travel through events and actions without ending up in
/// logs or lingering in freed memory.
///
/// An empty passphrase means "no passphrase": [`crate::seal`] produces an
/// unencrypted envelope for it and [`crate::open`] treats it as absent.
#[derive(Clone, PartialEq, Eq)]
pub struct Passphrase(String);

impl Passphrase {
    /// Wrap a passphrase.
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self(passphrase.into())
    }

    /// Wrap a passphrase, mapping the empty string to `None`.
    pub fn non_empty(passphrase: impl Into<String>) -> Option<Self> {
        let passphrase = Self::new(passphrase);
        if passphrase.is_empty() { None } else { Some(passphrase) }
    }

    /// Passphrase text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// UTF-8 bytes fed to SHA-256 and PBKDF2.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Returns true for the empty passphrase.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Passphrase {
    fn from(passphrase: &str) -> Self {
        Self::new(passphrase)
    }
}

impl From<String> for Passphrase {
    fn from(passphrase: String) -> Self {
        Self(passphrase)
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(***)")
    }
}

impl Drop for Passphrase {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let passphrase = Passphrase::new("hunter2");
        assert_eq!(format!("{passphrase:?}"), "Passphrase(***)");
    }

    #[test]
    fn non_empty_filters_empty_string() {
        assert!(Passphrase::non_empty("").is_none());
        assert_eq!(Passphrase::non_empty("a").map(|p| p.as_str().to_owned()), Some("a".into()));
    }

    #[test]
    fn bytes_are_utf8() {
        assert_eq!(Passphrase::from("é").as_bytes(), &[0xC3, 0xA9]);
    }
}
