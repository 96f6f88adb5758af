// Integration test utilities and common code
// WHY: Centralized utilities avoid duplication across integration tests
#![allow(dead_code)]

use anyhow::{bail, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use senryu::{ChatMessage, MoraCounter, PhoneticAnnotator, SenryuDetector, Token};

/// One token per character with no reading, so every kana counts exactly once
pub struct CharAnnotator;

impl PhoneticAnnotator for CharAnnotator {
    fn annotate(&self, text: &str) -> Result<Vec<Token>> {
        Ok(text.chars().map(|c| Token::new(c.to_string(), None)).collect())
    }
}

/// The whole text as one token with no reading
pub struct WholeTextAnnotator;

impl PhoneticAnnotator for WholeTextAnnotator {
    fn annotate(&self, text: &str) -> Result<Vec<Token>> {
        Ok(vec![Token::new(text, None)])
    }
}

/// Always fails, standing in for a broken analyzer
pub struct FailingAnnotator;

impl PhoneticAnnotator for FailingAnnotator {
    fn annotate(&self, _text: &str) -> Result<Vec<Token>> {
        bail!("analyzer failure")
    }
}

/// Per-character annotator that blocks for `delay` on every call
pub struct SlowAnnotator {
    pub delay: Duration,
}

impl PhoneticAnnotator for SlowAnnotator {
    fn annotate(&self, text: &str) -> Result<Vec<Token>> {
        std::thread::sleep(self.delay);
        CharAnnotator.annotate(text)
    }
}

/// Detector over an already-ready annotator
pub fn detector_with(annotator: Arc<dyn PhoneticAnnotator>) -> SenryuDetector {
    let counter = Arc::new(MoraCounter::with_annotator(annotator));
    SenryuDetector::with_counter(counter).expect("Detector creation should succeed")
}

/// Deterministic detector: one mora per kana character
pub fn char_detector() -> SenryuDetector {
    detector_with(Arc::new(CharAnnotator))
}

/// Build a chat message for monitor tests
pub fn message(id: &str, channel_id: &str, content: &str) -> ChatMessage {
    ChatMessage {
        id: id.to_string(),
        guild_id: Some("guild-1".to_string()),
        channel_id: channel_id.to_string(),
        author_id: "author-1".to_string(),
        author_is_bot: false,
        content: content.to_string(),
    }
}

/// Test fixture helper for creating temporary store and message files
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_path = temp_dir.path().to_path_buf();

        Self { temp_dir, root_path }
    }

    /// Path of the store file inside the fixture
    pub fn store_path(&self) -> PathBuf {
        self.root_path.join("senryu_store.json")
    }

    /// Write a file with given content, creating parent directories
    pub fn create_file<P: AsRef<Path>>(&self, relative_path: P, content: &str) -> PathBuf {
        let file_path = self.root_path.join(relative_path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }
}
