// WHY: strips chat-platform noise before any mora counting happens
// Markup is removed with a compiled multi-pattern regex, emoji and whitespace with char predicates

use anyhow::{Context, Result};
use regex_automata::meta::Regex;
use tracing::debug;

/// Markup classes removed from raw message text, in removal order
pub const MARKUP_PATTERNS: &[&str] = &[
    // Hyperlinks run until the next whitespace
    r"https?://\S+",
    // User mention (optionally nickname form) and role mention
    r"<@[!&]?[0-9]+>",
    // Channel reference
    r"<#[0-9]+>",
    // Inline custom emoji, static or animated
    r"<a?:[a-zA-Z0-9_]+:[0-9]+>",
];

/// True for characters in the pictographic emoji blocks stripped from messages
pub fn is_pictographic_emoji(c: char) -> bool {
    matches!(
        c,
        '\u{1F600}'..='\u{1F64F}'
            | '\u{1F300}'..='\u{1F5FF}'
            | '\u{1F680}'..='\u{1F6FF}'
            | '\u{1F1E0}'..='\u{1F1FF}'
            | '\u{2600}'..='\u{26FF}'
            | '\u{2700}'..='\u{27BF}'
    )
}

/// Produces clean text: no markup, no emoji, no whitespace
pub struct TextNormalizer {
    markup: Regex,
}

impl TextNormalizer {
    /// Compile the markup patterns once
    pub fn new() -> Result<Self> {
        let markup = Regex::new_many(MARKUP_PATTERNS)
            .context("Failed to compile message markup patterns")?;
        Ok(Self { markup })
    }

    /// Normalize raw message text. An empty result means there is nothing to detect.
    pub fn normalize(&self, raw: &str) -> String {
        let mut without_markup = String::with_capacity(raw.len());
        let mut last_end = 0;

        for mat in self.markup.find_iter(raw) {
            without_markup.push_str(&raw[last_end..mat.start()]);
            last_end = mat.end();
        }
        without_markup.push_str(&raw[last_end..]);

        // char::is_whitespace covers the ideographic space U+3000 as well
        let clean: String = without_markup
            .chars()
            .filter(|&c| !is_pictographic_emoji(c) && !c.is_whitespace())
            .collect();

        debug!(raw_len = raw.len(), clean_len = clean.len(), "Normalized message text");
        clean
    }
}
