//! Text pools for generated messages

use rand::seq::IndexedRandom;

/// Reply templates; `{text}` is replaced with the message being answered
pub const REPLY_TEMPLATES: [&str; 8] = [
    "You said \"{text}\"? Interesting.",
    "Got it: {text}",
    "Haha, \"{text}\" made my day",
    "Wait, {text}? Tell me more.",
    "Noted. \"{text}\"",
    "I was just thinking about {text}!",
    "Re: {text}. Let me get back to you on that.",
    "\"{text}\", agreed.",
];

/// Bodies for unsolicited messages
pub const AUTO_PHRASES: [&str; 10] = [
    "Hey, are you around?",
    "Did you see the latest build?",
    "Lunch later?",
    "Just pushed the fix, can you take a look?",
    "Running five minutes late.",
    "Who's up for a call this afternoon?",
    "That meeting could have been an email.",
    "Check your inbox when you get a chance.",
    "Coffee?",
    "Happy Friday!",
];

/// Build a reply that quotes `original`
pub fn reply_text(original: &str) -> String {
    let template = REPLY_TEMPLATES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("{text}");
    template.replace("{text}", original)
}

pub fn random_phrase() -> &'static str {
    AUTO_PHRASES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(AUTO_PHRASES[0])
}
