//! Demo Traffic
//!
//! Stand-in for a remote when no endpoint is configured. Produces the
//! same JSON text a real server would send so it can go through the
//! normal parse and dispatch path.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::json;

use super::frames::MessageFrame;

/// Number of demo conversations the generator spreads messages over
pub const DEMO_CHAT_COUNT: u32 = 3;

const DEMO_SENDERS: &[(&str, &str)] = &[
    ("demo_ada", "Ada"),
    ("demo_linus", "Linus"),
    ("demo_grace", "Grace"),
];

const DEMO_LINES: &[&str] = &[
    "Anyone up for lunch?",
    "Just pushed the fix, can you take a look?",
    "Running five minutes late.",
    "Did you see the release notes?",
    "Ping me when you're free.",
];

/// Chat id used by the demo generator for conversation `n` (1-based)
pub fn demo_chat_id(n: u32) -> String {
    format!("demo-chat-{}", n)
}

/// Build one synthetic inbound `MESSAGE` frame as wire text
pub fn synthesize_frame() -> String {
    let mut rng = rand::rng();
    let chat_id = demo_chat_id(rng.random_range(1..=DEMO_CHAT_COUNT));
    let (sender_id, sender_name) = DEMO_SENDERS
        .choose(&mut rng)
        .copied()
        .unwrap_or(("demo_bot", "Demo"));
    let text = DEMO_LINES.choose(&mut rng).copied().unwrap_or("Hello!");

    let payload = MessageFrame::compose(chat_id, text, sender_id, sender_name);
    json!({ "type": "MESSAGE", "payload": payload }).to_string()
}
