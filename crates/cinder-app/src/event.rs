//! Inputs to the read and write state machines.
//!
//! Events come from two sources: the reader or writer (driver input) and
//! completions of side effects the runtime executed on the machine's behalf.

use cinder_core::{Handle, Paste, PasteError, StoreError};
use cinder_crypto::Passphrase;
use cinder_proto::FramedContent;

use crate::WriteRequest;

/// Events processed by [`crate::ReadSession`].
#[derive(Debug)]
pub enum ReadEvent {
    /// Fetch finished. `None` means not found or expired.
    FetchCompleted(Option<Paste>),

    /// Fetch failed at the store.
    FetchFailed(StoreError),

    /// Reader asked to fetch again after a failure.
    RetryFetch,

    /// Reader submitted a passphrase.
    PassphraseSubmitted(Passphrase),

    /// Reader asked to show an unencrypted paste.
    RevealRequested,

    /// Decrypt and decode finished.
    DecryptCompleted(Result<FramedContent, PasteError>),

    /// Store acknowledged the delete.
    DeleteCompleted,

    /// Delete failed at the store.
    DeleteFailed(StoreError),

    /// Reader asked to retry a failed delete.
    RetryDelete,

    /// Reader pressed "burn now".
    BurnRequested,

    /// Burn transition interval is over.
    BurnTransitionElapsed,

    /// Reader left the session.
    Abandoned,
}

/// Events processed by [`crate::WriteFlow`].
#[derive(Debug)]
pub enum WriteEvent {
    /// Writer submitted content.
    Submit(WriteRequest),

    /// Writer accepted the large-encryption warning.
    Confirmed,

    /// Writer declined the large-encryption warning.
    Declined,

    /// Envelope sealed.
    Sealed(Paste),

    /// Store accepted the upload.
    UploadCompleted(Handle),

    /// Store rejected the upload.
    UploadFailed(StoreError),

    /// Writer asked to retry a failed upload.
    RetryUpload,

    /// Writer gave up.
    Cancelled,
}
