//! End-to-end read and write scenarios through the production runtimes.

use std::time::Duration;

use cinder_app::{AppConfig, ContentKind, ReadEvent, ReadState, RuntimeError, WriteError, WriteRequest};
use cinder_core::{Expiration, Handle, PasteError};
use cinder_crypto::Passphrase;
use cinder_harness::{SimReadDriver, SimWriteDriver, Step, World};

const DEADLINE: Duration = Duration::from_secs(120);

async fn within<F: std::future::Future>(fut: F) -> F::Output {
    tokio::time::timeout(DEADLINE, fut).await.expect("simulation stalled")
}

fn submit(passphrase: &str) -> ReadEvent {
    ReadEvent::PassphraseSubmitted(Passphrase::new(passphrase))
}

#[tokio::test(start_paused = true)]
async fn plain_file_is_read_once() {
    let world = World::new(1);
    let request = WriteRequest::file("note.txt", "text/plain", b"hello".to_vec())
        .with_expiration(Expiration::OneDay);
    let (handle, link) = within(world.publish(request)).await.unwrap();
    assert_eq!(Handle::from_link(&link), Some(handle.clone()));

    let driver = SimReadDriver::new([Step::on(ReadState::NotEncrypted, ReadEvent::RevealRequested)]);
    let outcome = within(world.read_with(driver.clone(), &handle)).await;

    assert_eq!(outcome.session().state(), ReadState::Burned);
    assert_eq!(outcome.trace.states()[..3], [
        ReadState::Loading,
        ReadState::NotEncrypted,
        ReadState::Viewing
    ]);

    let seen = driver.seen().unwrap();
    assert_eq!(seen.title, "note.txt");
    assert_eq!(seen.body, b"hello");
    assert_eq!(seen.kind, ContentKind::File);

    // Second read finds nothing
    let again = within(world.read(&handle, [])).await;
    assert_eq!(again.session().error(), Some(&PasteError::NotFound));
    assert_eq!(again.trace.states(), vec![ReadState::Loading, ReadState::Burned]);
}

#[tokio::test(start_paused = true)]
async fn wrong_passphrase_then_right_one() {
    let world = World::new(2);
    let request = WriteRequest::message("top secret").with_passphrase("secret");
    let (handle, _) = within(world.publish(request)).await.unwrap();

    let driver = SimReadDriver::new([
        Step::on(ReadState::Encrypted, submit("wrong")),
        Step::on(ReadState::Encrypted, submit("secret")),
    ]);
    let outcome = within(world.read_with(driver.clone(), &handle)).await;
    outcome.session();

    let rejected = outcome.trace.snapshots().iter().find(|s| s.error.is_some()).unwrap();
    assert_eq!(rejected.state, ReadState::Encrypted);
    assert_eq!(rejected.error, Some(PasteError::WrongPassword));
    assert!(!rejected.revealed);

    let seen = driver.seen().unwrap();
    assert_eq!(seen.body, b"top secret");
    assert_eq!(seen.kind, ContentKind::Message);
    assert!(!world.memory().contains(&handle));
}

#[tokio::test(start_paused = true)]
async fn long_title_truncated_to_255_bytes() {
    let world = World::new(3);
    let title = "a".repeat(300);
    let request = WriteRequest::file(title, "application/pdf", vec![1, 2, 3]);
    let (handle, _) = within(world.publish(request)).await.unwrap();

    let driver = SimReadDriver::new([Step::on(ReadState::NotEncrypted, ReadEvent::RevealRequested)]);
    let _ = within(world.read_with(driver.clone(), &handle)).await;

    let seen = driver.seen().unwrap();
    assert_eq!(seen.title, "a".repeat(255));
    assert_eq!(seen.body, [1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn empty_passphrase_is_rejected_without_decrypting() {
    let world = World::new(4);
    let (handle, _) =
        within(world.publish(WriteRequest::message("x").with_passphrase("pw"))).await.unwrap();

    let outcome = within(world.read(&handle, [Step::on(ReadState::Encrypted, submit(""))])).await;

    let last_encrypted =
        outcome.trace.snapshots().iter().rev().find(|s| s.state == ReadState::Encrypted).unwrap();
    assert_eq!(last_encrypted.error, Some(PasteError::PasswordRequired));
    assert!(world.memory().contains(&handle), "unread paste survives");
}

#[tokio::test(start_paused = true)]
async fn expired_paste_reads_as_not_found() {
    let world = World::new(5);
    let request = WriteRequest::message("soon gone").with_expiration(Expiration::TenMinutes);
    let (handle, _) = within(world.publish(request)).await.unwrap();

    world.env.advance_wall_clock(Duration::from_secs(9 * 60));
    assert!(world.memory().contains(&handle));

    world.env.advance_wall_clock(Duration::from_secs(60));
    let outcome = within(world.read(&handle, [])).await;
    assert_eq!(outcome.session().error(), Some(&PasteError::NotFound));
}

#[tokio::test(start_paused = true)]
async fn burn_wipes_after_transition() {
    let world = World::new(6);
    let (handle, _) = within(world.publish(WriteRequest::message("bye"))).await.unwrap();

    let start = tokio::time::Instant::now();
    let outcome = within(world.read(&handle, [
        Step::on(ReadState::NotEncrypted, ReadEvent::RevealRequested),
        // Press burn while the reveal's delete is still in flight
        Step::on(ReadState::Viewing, ReadEvent::BurnRequested).now(),
    ]))
    .await;

    let session = outcome.session();
    assert_eq!(session.state(), ReadState::Burned);
    assert!(session.presented().is_none());
    assert_eq!(session.snapshot().deletes_issued, 1);
    assert!(start.elapsed() >= Duration::from_secs(1));
    assert!(!world.memory().contains(&handle));
}

#[tokio::test(start_paused = true)]
async fn demo_mode_requires_passphrase_and_short_expiry() {
    let world = World::new(7).with_config(AppConfig::demo());

    let err = within(world.publish(WriteRequest::message("x"))).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Write(WriteError::EncryptionRequired)));

    let request = WriteRequest::message("x").with_passphrase("pw").with_expiration(Expiration::OneWeek);
    let err = within(world.publish(request)).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Write(WriteError::ExpirationNotAllowed(Expiration::OneWeek))));

    let request = WriteRequest::message("x").with_passphrase("pw").with_expiration(Expiration::OneDay);
    assert!(within(world.publish(request)).await.is_ok());
    assert_eq!(world.memory().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn large_encrypted_upload_needs_confirmation() {
    let mut config = AppConfig::default();
    config.limits.caution_bytes = 4;
    let world = World::new(8).with_config(config);

    let declining = SimWriteDriver::new().declining();
    let request = WriteRequest::message("too big").with_passphrase("pw");
    let err = within(world.publish_with(declining.clone(), request)).await.unwrap_err();

    assert!(matches!(err, RuntimeError::Write(WriteError::Cancelled)));
    assert_eq!(declining.log().confirmations, vec![7]);
    assert!(world.memory().is_empty());

    // Unencrypted uploads skip the prompt
    let confirming = SimWriteDriver::new();
    let result = within(world.publish_with(confirming.clone(), WriteRequest::message("too big"))).await;
    assert!(result.is_ok());
    assert!(confirming.log().confirmations.is_empty());
}

#[tokio::test(start_paused = true)]
async fn oversized_upload_rejected_before_sealing() {
    let mut config = AppConfig::default();
    config.limits.max_bytes = 4;
    let world = World::new(9).with_config(config);

    let writer = SimWriteDriver::new();
    let err = within(world.publish_with(writer.clone(), WriteRequest::message("hello"))).await.unwrap_err();

    assert!(matches!(
        err,
        RuntimeError::Write(WriteError::Paste(PasteError::SizeExceeded { size: 5, limit: 4 }))
    ));
    assert!(!writer.log().states.contains(&"sealing"));
    assert_eq!(world.memory().stats().creates, 0);
}
