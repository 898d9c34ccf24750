//! Write lifecycle state machine.
//!
//! ```text
//! Composing ─► (AwaitingConfirmation) ─► Sealing ─► Uploading ─► Finished
//!     │               │ declined                      │   ▲
//!     └── rejected ───┴──────────► Failed ◄─ cancel ─ UploadFailed
//! ```
//!
//! Every rejection (demo restrictions, empty body, size ceiling) happens in
//! `Composing`, before the body is framed or any key is derived.

use std::fmt;

use cinder_core::{Expiration, Handle, Paste, SizeCheck, StoreError};
use cinder_crypto::Passphrase;
use cinder_proto::encode;
use zeroize::Zeroizing;

use crate::{AppConfig, WriteAction, WriteError, WriteEvent, WriteState};

/// Content to publish.
pub struct WriteRequest {
    /// MIME type label stored beside the envelope.
    pub content_type: String,
    /// Title, empty for hand-written messages. Truncated to 255 bytes.
    pub title: String,
    /// Content bytes.
    pub body: Zeroizing<Vec<u8>>,
    /// Passphrase; `None` or empty for an unencrypted paste.
    pub passphrase: Option<Passphrase>,
    /// Lifetime.
    pub expiration: Expiration,
}

impl WriteRequest {
    /// Hand-written text message.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            content_type: "text/plain".to_owned(),
            title: String::new(),
            body: Zeroizing::new(text.into().into_bytes()),
            passphrase: None,
            expiration: Expiration::default(),
        }
    }

    /// Uploaded file.
    pub fn file(
        title: impl Into<String>,
        content_type: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            title: title.into(),
            body: Zeroizing::new(body.into()),
            passphrase: None,
            expiration: Expiration::default(),
        }
    }

    /// Encrypt with `passphrase`.
    #[must_use]
    pub fn with_passphrase(mut self, passphrase: impl Into<Passphrase>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    /// Expire after `expiration`.
    #[must_use]
    pub fn with_expiration(mut self, expiration: Expiration) -> Self {
        self.expiration = expiration;
        self
    }

    fn encrypting(&self) -> bool {
        self.passphrase.as_ref().is_some_and(|p| !p.is_empty())
    }
}

impl fmt::Debug for WriteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteRequest")
            .field("content_type", &self.content_type)
            .field("body_len", &self.body.len())
            .field("encrypted", &self.encrypting())
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

/// Framed content waiting for confirmation or sealing.
struct Staged {
    framed: Zeroizing<Vec<u8>>,
    passphrase: Option<Passphrase>,
    content_type: String,
}

/// Write lifecycle for one paste.
pub struct WriteFlow {
    config: AppConfig,
    state: WriteState,
    staged: Option<Staged>,
    /// Sealed paste, kept until the upload succeeds so it can be retried
    /// without sealing again.
    sealed: Option<Paste>,
    expiration: Expiration,
    error: Option<WriteError>,
    upload_error: Option<StoreError>,
    upload_attempts: u32,
}

impl WriteFlow {
    /// Create a flow in `Composing`.
    pub fn new(config: AppConfig) -> Self {
        let expiration = config.default_expiration;
        Self {
            config,
            state: WriteState::Composing,
            staged: None,
            sealed: None,
            expiration,
            error: None,
            upload_error: None,
            upload_attempts: 0,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: WriteEvent) -> Vec<WriteAction> {
        match event {
            WriteEvent::Submit(request) => self.submit(request),
            WriteEvent::Confirmed => self.confirm(),
            WriteEvent::Declined => match self.state {
                WriteState::AwaitingConfirmation { .. } => self.fail(WriteError::Cancelled),
                _ => vec![],
            },
            WriteEvent::Sealed(paste) => self.on_sealed(paste),
            WriteEvent::UploadCompleted(handle) => self.on_uploaded(handle),
            WriteEvent::UploadFailed(err) => self.on_upload_failed(err),
            WriteEvent::RetryUpload => self.retry_upload(),
            WriteEvent::Cancelled => {
                if self.state.is_terminal() {
                    return vec![];
                }
                self.fail(WriteError::Cancelled)
            },
        }
    }

    fn submit(&mut self, request: WriteRequest) -> Vec<WriteAction> {
        if self.state != WriteState::Composing {
            return vec![];
        }

        let encrypting = request.encrypting();
        if self.config.require_passphrase && !encrypting {
            return self.fail(WriteError::EncryptionRequired);
        }
        if !self.config.allows(request.expiration) {
            return self.fail(WriteError::ExpirationNotAllowed(request.expiration));
        }
        if request.body.is_empty() {
            return self.fail(WriteError::EmptyBody);
        }

        let size = request.body.len() as u64;
        let check = match self.config.limits.check(size, encrypting) {
            Ok(check) => check,
            Err(err) => return self.fail(err.into()),
        };

        let WriteRequest { content_type, title, body, passphrase, expiration } = request;
        self.expiration = expiration;
        self.staged = Some(Staged {
            framed: Zeroizing::new(encode(&title, &body)),
            passphrase: passphrase.filter(|p| !p.is_empty()),
            content_type,
        });

        match check {
            SizeCheck::Accepted => self.begin_seal(),
            SizeCheck::NeedsConfirmation => {
                tracing::debug!(size, "large encrypted upload needs confirmation");
                self.state = WriteState::AwaitingConfirmation { size };
                vec![WriteAction::Render, WriteAction::RequestConfirmation { size }]
            },
        }
    }

    fn confirm(&mut self) -> Vec<WriteAction> {
        if !matches!(self.state, WriteState::AwaitingConfirmation { .. }) {
            return vec![];
        }
        self.begin_seal()
    }

    fn begin_seal(&mut self) -> Vec<WriteAction> {
        let Some(Staged { framed, passphrase, content_type }) = self.staged.take() else {
            return self.fail(WriteError::Cancelled);
        };
        self.state = WriteState::Sealing;
        vec![WriteAction::Render, WriteAction::Seal { framed, passphrase, content_type }]
    }

    fn on_sealed(&mut self, paste: Paste) -> Vec<WriteAction> {
        if self.state != WriteState::Sealing {
            return vec![];
        }
        self.sealed = Some(paste.clone());
        self.upload(paste)
    }

    fn upload(&mut self, paste: Paste) -> Vec<WriteAction> {
        self.state = WriteState::Uploading;
        self.upload_attempts += 1;
        tracing::debug!(attempt = self.upload_attempts, len = paste.len(), "uploading");
        vec![WriteAction::Render, WriteAction::Upload { paste, expiration: self.expiration }]
    }

    fn on_uploaded(&mut self, handle: Handle) -> Vec<WriteAction> {
        if self.state != WriteState::Uploading {
            return vec![];
        }
        let link = handle.share_link(&self.config.origin);
        tracing::info!(%handle, expiration = %self.expiration, "paste published");

        self.sealed = None;
        self.upload_error = None;
        self.state = WriteState::Finished { handle, link };
        vec![WriteAction::Render]
    }

    fn on_upload_failed(&mut self, err: StoreError) -> Vec<WriteAction> {
        if self.state != WriteState::Uploading {
            return vec![];
        }
        tracing::warn!(error = %err, attempt = self.upload_attempts, "upload failed");
        self.upload_error = Some(err);
        self.state = WriteState::UploadFailed;
        vec![WriteAction::Render]
    }

    fn retry_upload(&mut self) -> Vec<WriteAction> {
        if self.state != WriteState::UploadFailed {
            return vec![];
        }
        match self.sealed.clone() {
            Some(paste) => self.upload(paste),
            None => self.fail(WriteError::Cancelled),
        }
    }

    fn fail(&mut self, err: WriteError) -> Vec<WriteAction> {
        tracing::debug!(error = %err, from = self.state.name(), "write failed");

        // A failed upload surfaces as the storage error that caused it
        let err = match (err, self.upload_error.take()) {
            (WriteError::Cancelled, Some(store)) => WriteError::Paste(store.into()),
            (err, _) => err,
        };

        self.staged = None;
        self.sealed = None;
        self.error = Some(err);
        self.state = WriteState::Failed;
        vec![WriteAction::Render]
    }

    /// Current state.
    pub fn state(&self) -> &WriteState {
        &self.state
    }

    /// Why the flow failed, once `Failed`.
    pub fn error(&self) -> Option<&WriteError> {
        self.error.as_ref()
    }

    /// Last upload failure, while `UploadFailed`.
    pub fn upload_error(&self) -> Option<&StoreError> {
        self.upload_error.as_ref()
    }

    /// Upload attempts so far.
    pub fn upload_attempts(&self) -> u32 {
        self.upload_attempts
    }

    /// Lifetime of the paste being written.
    pub fn expiration(&self) -> Expiration {
        self.expiration
    }

    /// Share link, once `Finished`.
    pub fn link(&self) -> Option<&str> {
        match &self.state {
            WriteState::Finished { link, .. } => Some(link),
            _ => None,
        }
    }
}
