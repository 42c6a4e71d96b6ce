#![no_main]

//! Fuzz target for webhook body parsing.

use callclock_core::{EventKind, WebhookEvent};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(event) = WebhookEvent::from_slice(data) else {
        return;
    };

    if let EventKind::ConversationStarted = event.kind() {
        if let Some(id) = event.conversation_id() {
            assert!(!id.as_str().trim().is_empty());
        }
    }
});
