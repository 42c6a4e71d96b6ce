//! Property tests for webhook signature verification.

use callclock_api::crypto::{generate_hmac_hex, verify_signature, SignatureError};
use proptest::prelude::*;

fn secret() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}"
}

proptest! {
    #[test]
    fn signed_payloads_always_verify(
        payload in prop::collection::vec(any::<u8>(), 0..2048),
        secret in secret(),
    ) {
        let signature = generate_hmac_hex(&payload, &secret).unwrap();

        prop_assert!(verify_signature(&payload, &signature, &secret).is_ok());
        let prefixed = format!("sha256={signature}");
        prop_assert!(verify_signature(&payload, &prefixed, &secret).is_ok());
    }

    #[test]
    fn any_flipped_payload_byte_fails(
        payload in prop::collection::vec(any::<u8>(), 1..512),
        index in any::<prop::sample::Index>(),
        secret in secret(),
    ) {
        let signature = generate_hmac_hex(&payload, &secret).unwrap();

        let mut tampered = payload.clone();
        let i = index.index(tampered.len());
        tampered[i] ^= 0x01;

        prop_assert_eq!(
            verify_signature(&tampered, &signature, &secret),
            Err(SignatureError::VerificationFailed)
        );
    }

    #[test]
    fn different_secret_fails(
        payload in prop::collection::vec(any::<u8>(), 0..512),
        secret in secret(),
        other in secret(),
    ) {
        prop_assume!(secret != other);
        let signature = generate_hmac_hex(&payload, &secret).unwrap();

        prop_assert!(verify_signature(&payload, &signature, &other).is_err());
    }

    #[test]
    fn arbitrary_header_values_never_panic(
        payload in prop::collection::vec(any::<u8>(), 0..256),
        header in ".{0,128}",
    ) {
        let _ = verify_signature(&payload, &header, "secret");
    }
}
