#![no_main]

//! Fuzz target for webhook signature validation.
//!
//! Splits the input into a header value and a payload and checks that
//! verification never panics and never accepts a header it did not produce.

use callclock_api::crypto::{generate_hmac_hex, verify_signature, SignatureConfig};
use libfuzzer_sys::fuzz_target;

const SECRET: &str = "fuzz-secret";

fuzz_target!(|data: &[u8]| {
    let split = data.first().map_or(0, |&b| usize::from(b)).min(data.len());
    let (header, payload) = data.split_at(split);

    let header = String::from_utf8_lossy(header);
    let config = SignatureConfig::with_default_header(SECRET);

    let _ = verify_signature(payload, &header, SECRET);
    let _ = config.verify(payload, Some(header.as_ref()));
    let _ = config.verify(payload, None);

    if let Ok(expected) = generate_hmac_hex(payload, SECRET) {
        let accepted = verify_signature(payload, &header, SECRET).is_ok();
        let trimmed = header.trim();
        let digest = trimmed.strip_prefix("sha256=").unwrap_or(trimmed);
        if accepted {
            assert!(digest.eq_ignore_ascii_case(&expected), "accepted a foreign signature");
        }

        assert!(verify_signature(payload, &expected, SECRET).is_ok());
    }
});
