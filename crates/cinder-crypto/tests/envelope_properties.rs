//! Property-based tests for the passphrase envelope
//!
//! Every encrypted case pays for a full PBKDF2 derivation, so the encrypted
//! properties run a small number of cases.

use cinder_crypto::{
    EnvelopeError, HEADER_LEN, IV_LEN, MARKER_LEN, Passphrase, open, probe_encrypted, seal,
    verify_password,
};
use proptest::prelude::*;

fn passphrase() -> impl Strategy<Value = String> {
    ".{1,24}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_encrypted_round_trip(
        pass in passphrase(),
        iv in any::<[u8; IV_LEN]>(),
        framed in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let pass = Passphrase::new(pass);
        let envelope = seal(&framed, Some(&pass), iv);

        // PROPERTY: Sealed length is header plus payload
        prop_assert_eq!(envelope.len(), HEADER_LEN + framed.len());
        prop_assert!(probe_encrypted(&envelope));
        prop_assert!(verify_password(&envelope, &pass));

        // PROPERTY: The right passphrase recovers the input exactly
        prop_assert_eq!(open(&envelope, Some(&pass)).unwrap(), framed);
    }

    #[test]
    fn prop_other_passphrase_rejected_before_decrypting(
        pass in passphrase(),
        other in passphrase(),
        framed in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        prop_assume!(pass != other);

        let envelope = seal(&framed, Some(&Passphrase::new(pass)), [0u8; IV_LEN]);
        prop_assert_eq!(
            open(&envelope, Some(&Passphrase::new(other))),
            Err(EnvelopeError::WrongPassword)
        );
    }
}

proptest! {
    #[test]
    fn prop_unencrypted_round_trip(framed in prop::collection::vec(any::<u8>(), 0..2048)) {
        let envelope = seal(&framed, None, [0u8; IV_LEN]);

        prop_assert_eq!(envelope.len(), MARKER_LEN + framed.len());
        prop_assert!(!probe_encrypted(&envelope));
        prop_assert_eq!(open(&envelope, None).unwrap(), framed);
    }

    #[test]
    fn prop_open_never_panics_without_passphrase(
        bytes in prop::collection::vec(any::<u8>(), 0..128),
    ) {
        match open(&bytes, None) {
            Ok(framed) => {
                // PROPERTY: Only unencrypted envelopes open without a passphrase
                prop_assert!(!probe_encrypted(&bytes));
                prop_assert_eq!(framed.len(), bytes.len() - MARKER_LEN);
            },
            Err(EnvelopeError::PasswordRequired) => prop_assert!(probe_encrypted(&bytes)),
            Err(EnvelopeError::Truncated { required, actual }) => {
                prop_assert!(actual < required);
                prop_assert_eq!(actual, bytes.len());
            },
            Err(EnvelopeError::WrongPassword) => prop_assert!(false, "no passphrase was given"),
        }
    }

    #[test]
    fn prop_probe_matches_marker(bytes in prop::collection::vec(any::<u8>(), 0..96)) {
        let expected = bytes.iter().take(MARKER_LEN).any(|&b| b != 0);
        prop_assert_eq!(probe_encrypted(&bytes), expected);
    }
}
