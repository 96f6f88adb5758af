// WHY: phonetic readings come from a morphological analyzer behind a small trait
// The mora counter only sees surface/reading pairs, never the analyzer itself

use anyhow::{anyhow, Result};
use lindera::dictionary::load_dictionary;
use lindera::mode::Mode;
use lindera::segmenter::Segmenter;
use lindera::tokenizer::Tokenizer;
use tracing::info;
use wana_kana::ConvertJapanese;

/// IPADIC feature column holding the katakana reading
const IPADIC_READING_FIELD: usize = 7;

/// Placeholder the dictionary uses for "no value"
const MISSING_FEATURE: &str = "*";

/// One analyzed token: what was written and, when known, how it is read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    pub reading: Option<String>,
}

impl Token {
    pub fn new(surface: impl Into<String>, reading: Option<String>) -> Self {
        Self {
            surface: surface.into(),
            reading,
        }
    }

    /// Reading if present, otherwise the surface form
    pub fn reading_or_surface(&self) -> &str {
        self.reading.as_deref().unwrap_or(&self.surface)
    }
}

/// Splits text into tokens carrying phonetic readings
pub trait PhoneticAnnotator: Send + Sync {
    fn annotate(&self, text: &str) -> Result<Vec<Token>>;
}

/// Convert a reading into hiragana, the alphabet the mora counter works in.
/// Katakana and romaji are converted; digits and kanji pass through untouched.
pub fn to_canonical_syllabary(reading: &str) -> String {
    reading.to_hiragana()
}

/// Annotator backed by lindera with the embedded IPADIC dictionary
pub struct LinderaAnnotator {
    tokenizer: Tokenizer,
}

impl LinderaAnnotator {
    /// Load the embedded dictionary. Slow; callers run this once and share the result.
    pub fn load() -> Result<Self> {
        let start_time = std::time::Instant::now();
        let dictionary = load_dictionary("embedded://ipadic")
            .map_err(|err| anyhow!("Failed to load IPADIC dictionary: {err}"))?;
        let segmenter = Segmenter::new(Mode::Normal, dictionary, None);
        let tokenizer = Tokenizer::new(segmenter);

        info!(
            "Loaded lindera IPADIC tokenizer in {}ms",
            start_time.elapsed().as_millis()
        );
        Ok(Self { tokenizer })
    }
}

impl PhoneticAnnotator for LinderaAnnotator {
    fn annotate(&self, text: &str) -> Result<Vec<Token>> {
        let mut tokens = self
            .tokenizer
            .tokenize(text)
            .map_err(|err| anyhow!("Tokenization failed: {err}"))?;

        let mut annotated = Vec::with_capacity(tokens.len());
        for token in tokens.iter_mut() {
            let surface = token.surface.as_ref().to_string();
            // Unknown words carry no reading column at all
            let reading = token
                .get_detail(IPADIC_READING_FIELD)
                .filter(|reading| *reading != MISSING_FEATURE && !reading.is_empty())
                .map(str::to_string);
            annotated.push(Token::new(surface, reading));
        }
        Ok(annotated)
    }
}
