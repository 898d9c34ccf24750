//! Property-based tests across the write and read state machines
//!
//! Content published through a `WriteFlow` must come back unchanged through a
//! `ReadSession`, and revealing it must issue exactly one delete.

use cinder_app::{
    AppConfig, Deletion, ReadAction, ReadEvent, ReadSession, ReadState, WriteAction, WriteEvent,
    WriteFlow, WriteRequest, WriteState,
};
use cinder_core::{Handle, Paste, PasteError};
use cinder_crypto::{IV_LEN, Passphrase, seal};
use proptest::prelude::*;

/// Drive a write to completion, executing its actions inline.
fn publish(request: WriteRequest, iv: [u8; IV_LEN]) -> (Handle, Paste) {
    let mut flow = WriteFlow::new(AppConfig::default());
    let mut pending = flow.handle(WriteEvent::Submit(request));
    let mut stored = None;

    while let Some(action) = pending.pop() {
        let event = match action {
            WriteAction::Render => continue,
            WriteAction::RequestConfirmation { .. } => WriteEvent::Confirmed,
            WriteAction::Seal { framed, passphrase, content_type } => {
                WriteEvent::Sealed(Paste::new(content_type, seal(&framed, passphrase.as_ref(), iv)))
            },
            WriteAction::Upload { paste, .. } => {
                let handle = Handle::for_envelope(paste.envelope());
                stored = Some((handle.clone(), paste));
                WriteEvent::UploadCompleted(handle)
            },
        };
        pending.extend(flow.handle(event));
    }

    assert!(matches!(flow.state(), WriteState::Finished { .. }), "write ended {:?}", flow.state());
    stored.unwrap()
}

/// Read `paste` until it is on screen, returning the session and every
/// delete it asked for.
fn reveal(handle: Handle, paste: Paste, passphrase: Option<Passphrase>) -> (ReadSession, usize) {
    let mut session = ReadSession::new(handle, &AppConfig::default());
    let _ = session.start();

    let mut pending = session.handle(ReadEvent::FetchCompleted(Some(paste)));
    let input = match (session.state(), passphrase) {
        (ReadState::Encrypted, Some(passphrase)) => ReadEvent::PassphraseSubmitted(passphrase),
        (state, _) => {
            assert_eq!(state, ReadState::NotEncrypted);
            ReadEvent::RevealRequested
        },
    };
    pending.extend(session.handle(input));

    let mut deletes = 0;
    while let Some(action) = pending.pop() {
        match action {
            ReadAction::Decrypt { paste, passphrase } => {
                let result = paste.decrypted(passphrase.as_ref());
                pending.extend(session.handle(ReadEvent::DecryptCompleted(result)));
            },
            ReadAction::Delete { .. } => deletes += 1,
            ReadAction::Render
            | ReadAction::Fetch { .. }
            | ReadAction::ScheduleBurnTransition { .. } => {},
        }
    }
    (session, deletes)
}

proptest! {
    #[test]
    fn prop_unencrypted_write_reads_back(
        title in "[a-zA-Z0-9 ._-]{0,40}",
        body in prop::collection::vec(any::<u8>(), 1..1024),
        iv in any::<[u8; IV_LEN]>(),
    ) {
        let request = WriteRequest::file(title.clone(), "application/octet-stream", body.clone());
        let (handle, paste) = publish(request, iv);
        prop_assert!(!paste.is_encrypted());

        let (session, deletes) = reveal(handle, paste, None);

        // PROPERTY: Content survives the round trip unchanged
        let presented = session.presented().unwrap();
        prop_assert_eq!(presented.title(), title.as_str());
        prop_assert_eq!(presented.body(), body.as_slice());
        prop_assert_eq!(presented.content_type(), "application/octet-stream");

        // PROPERTY: Revealing issues exactly one delete
        prop_assert_eq!(deletes, 1);
        prop_assert_eq!(session.deletion(), Deletion::InFlight);
    }
}

proptest! {
    // Sealing with a passphrase runs key derivation
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_encrypted_write_reads_back(
        pass in "[a-zA-Z0-9]{1,16}",
        title in "[a-z.]{0,20}",
        body in prop::collection::vec(any::<u8>(), 1..512),
    ) {
        let request = WriteRequest::file(title.clone(), "text/plain", body.clone())
            .with_passphrase(pass.as_str());
        let (handle, paste) = publish(request, [3; IV_LEN]);
        prop_assert!(paste.is_encrypted());

        let (session, deletes) = reveal(handle, paste, Some(Passphrase::new(pass)));

        let presented = session.presented().unwrap();
        prop_assert_eq!(presented.title(), title.as_str());
        prop_assert_eq!(presented.body(), body.as_slice());
        prop_assert_eq!(session.state(), ReadState::Viewing);
        prop_assert_eq!(deletes, 1);
    }

    #[test]
    fn prop_wrong_passphrase_never_reveals(
        pass in "[a-z]{1,12}",
        wrong in "[A-Z]{1,12}",
        body in prop::collection::vec(any::<u8>(), 1..256),
    ) {
        let request = WriteRequest::file("", "text/plain", body).with_passphrase(pass.as_str());
        let (handle, paste) = publish(request, [7; IV_LEN]);

        let mut session = ReadSession::new(handle, &AppConfig::default());
        let _ = session.start();
        let _ = session.handle(ReadEvent::FetchCompleted(Some(paste)));
        let actions = session.handle(ReadEvent::PassphraseSubmitted(Passphrase::new(wrong)));

        // PROPERTY: A rejected passphrase costs no key derivation and no delete
        prop_assert!(actions.iter().all(|a| matches!(a, ReadAction::Render)));
        prop_assert_eq!(session.state(), ReadState::Encrypted);
        prop_assert_eq!(session.error(), Some(&PasteError::WrongPassword));
        prop_assert_eq!(session.deletion(), Deletion::NotRequested);
    }
}
