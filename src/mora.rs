// WHY: mora counting over a lazily loaded, process-wide annotator
// Dictionary load happens once; early callers wait on the same in-flight load instead of failing

use anyhow::{anyhow, Context, Result};
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::annotator::{to_canonical_syllabary, LinderaAnnotator, PhoneticAnnotator};
use crate::script::count_kana_morae;

type AnnotatorLoader = Arc<dyn Fn() -> Result<Arc<dyn PhoneticAnnotator>> + Send + Sync>;

/// Outcome of the one-time load; a failure is kept so later counts do not reload
type LoadedAnnotator = std::result::Result<Arc<dyn PhoneticAnnotator>, Arc<anyhow::Error>>;

static GLOBAL_COUNTER: OnceLock<Arc<MoraCounter>> = OnceLock::new();

/// Counts morae in arbitrary text using phonetic readings from a shared annotator
pub struct MoraCounter {
    annotator: OnceCell<LoadedAnnotator>,
    loader: AnnotatorLoader,
}

impl MoraCounter {
    /// Counter whose annotator is built by `loader` on first use.
    /// The loader runs on the blocking pool exactly once, whether it succeeds or fails.
    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn PhoneticAnnotator>> + Send + Sync + 'static,
    {
        Self {
            annotator: OnceCell::new(),
            loader: Arc::new(loader),
        }
    }

    /// Counter around an annotator that is already ready
    pub fn with_annotator(annotator: Arc<dyn PhoneticAnnotator>) -> Self {
        let ready = Arc::clone(&annotator);
        Self {
            annotator: OnceCell::new_with(Some(Ok(annotator))),
            loader: Arc::new(move || Ok(Arc::clone(&ready))),
        }
    }

    /// Counter backed by lindera; the dictionary loads on first use
    pub fn lindera() -> Self {
        Self::with_loader(|| {
            let annotator: Arc<dyn PhoneticAnnotator> = Arc::new(LinderaAnnotator::load()?);
            Ok(annotator)
        })
    }

    /// Process-wide lindera counter shared by every detector that does not bring its own
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL_COUNTER.get_or_init(|| Arc::new(Self::lindera())))
    }

    /// True once the annotator has finished loading
    pub fn is_ready(&self) -> bool {
        matches!(self.annotator.get(), Some(Ok(_)))
    }

    /// Load the annotator now, surfacing any initialization failure.
    /// Lets callers tell "annotator broken" apart from "no senryu here".
    pub async fn warm_up(&self) -> Result<()> {
        self.annotator().await.map(|_| ())
    }

    async fn annotator(&self) -> Result<&Arc<dyn PhoneticAnnotator>> {
        let loaded = self
            .annotator
            .get_or_init(|| async {
                info!("Initializing phonetic annotator");
                let loader = Arc::clone(&self.loader);
                let loaded = tokio::task::spawn_blocking(move || loader())
                    .await
                    .context("Annotator initialization task panicked")
                    .and_then(|loaded| loaded);

                match &loaded {
                    Ok(_) => info!("Phonetic annotator ready"),
                    Err(err) => error!("Phonetic annotator failed to initialize: {err:#}"),
                }
                loaded.map_err(Arc::new)
            })
            .await;

        loaded.as_ref().map_err(|err| anyhow!("{err:#}"))
    }

    /// Count morae in `text`. Never fails: annotator or analysis errors count as zero.
    pub async fn count_morae(&self, text: &str) -> usize {
        let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if clean.is_empty() {
            return 0;
        }

        let annotator = match self.annotator().await {
            Ok(annotator) => annotator,
            Err(err) => {
                debug!("Phonetic annotator unavailable, counting zero: {err:#}");
                return 0;
            }
        };

        match annotator.annotate(&clean) {
            Ok(tokens) => {
                let count = tokens
                    .iter()
                    .map(|token| count_kana_morae(&to_canonical_syllabary(token.reading_or_surface())))
                    .sum();
                debug!(text = %clean, count, "Counted morae");
                count
            }
            Err(err) => {
                warn!("Failed to count morae for text {clean:?}: {err:#}");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::Token;
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// One token per character, read as written
    struct CharAnnotator;

    impl PhoneticAnnotator for CharAnnotator {
        fn annotate(&self, text: &str) -> Result<Vec<Token>> {
            Ok(text.chars().map(|c| Token::new(c.to_string(), None)).collect())
        }
    }

    /// The whole text as a single unread token
    struct WholeTextAnnotator;

    impl PhoneticAnnotator for WholeTextAnnotator {
        fn annotate(&self, text: &str) -> Result<Vec<Token>> {
            Ok(vec![Token::new(text, None)])
        }
    }

    /// Reads every kanji as ア, everything else as written
    struct KanjiAnnotator;

    impl PhoneticAnnotator for KanjiAnnotator {
        fn annotate(&self, text: &str) -> Result<Vec<Token>> {
            Ok(text
                .chars()
                .map(|c| {
                    let reading = matches!(c, '\u{4E00}'..='\u{9FFF}').then(|| "ア".to_string());
                    Token::new(c.to_string(), reading)
                })
                .collect())
        }
    }

    struct FailingAnnotator;

    impl PhoneticAnnotator for FailingAnnotator {
        fn annotate(&self, _text: &str) -> Result<Vec<Token>> {
            bail!("analyzer exploded")
        }
    }

    fn char_counter() -> MoraCounter {
        MoraCounter::with_annotator(Arc::new(CharAnnotator))
    }

    #[tokio::test]
    async fn test_count_empty_and_whitespace() {
        let counter = char_counter();
        assert_eq!(counter.count_morae("").await, 0);
        assert_eq!(counter.count_morae(" \u{3000}\n").await, 0);
    }

    #[tokio::test]
    async fn test_count_strips_whitespace() {
        assert_eq!(char_counter().count_morae("ふる いけ\u{3000}や").await, 5);
    }

    #[tokio::test]
    async fn test_count_small_kana_only_is_zero() {
        assert_eq!(char_counter().count_morae("ゃゅょァィ").await, 0);
    }

    #[tokio::test]
    async fn test_count_uses_reading_then_converts_katakana() {
        let counter = MoraCounter::with_annotator(Arc::new(KanjiAnnotator));
        assert_eq!(counter.count_morae("山のキョウ").await, 4);
    }

    #[tokio::test]
    async fn test_count_unreadable_surface_counts_zero() {
        assert_eq!(char_counter().count_morae("漢字123").await, 0);
    }

    #[tokio::test]
    async fn test_count_romaji_surface() {
        let counter = MoraCounter::with_annotator(Arc::new(WholeTextAnnotator));
        assert_eq!(counter.count_morae("furuikeya").await, 5);
        assert_eq!(counter.count_morae("kawazu tobikomu").await, 7);
    }

    #[tokio::test]
    async fn test_count_is_deterministic() {
        let counter = char_counter();
        let first = counter.count_morae("かわずとびこむ").await;
        let second = counter.count_morae("かわずとびこむ").await;
        assert_eq!(first, 7);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_annotation_failure_counts_zero() {
        let counter = MoraCounter::with_annotator(Arc::new(FailingAnnotator));
        assert_eq!(counter.count_morae("ふるいけや").await, 0);
    }

    #[tokio::test]
    async fn test_loader_failure_counts_zero_and_warm_up_reports_it() {
        let counter = MoraCounter::with_loader(|| Err(anyhow::anyhow!("dictionary missing")));
        assert_eq!(counter.count_morae("ふるいけや").await, 0);
        assert!(!counter.is_ready());

        let err = counter.warm_up().await.unwrap_err();
        assert!(format!("{err:#}").contains("dictionary missing"));
    }

    #[tokio::test]
    async fn test_with_annotator_is_ready_immediately() {
        let counter = char_counter();
        assert!(counter.is_ready());
        counter.warm_up().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_early_callers_share_one_initialization() {
        let loads = Arc::new(AtomicUsize::new(0));
        let loads_in_loader = Arc::clone(&loads);
        let counter = Arc::new(MoraCounter::with_loader(move || {
            loads_in_loader.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(100));
            let annotator: Arc<dyn PhoneticAnnotator> = Arc::new(CharAnnotator);
            Ok(annotator)
        }));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            handles.push(tokio::spawn(async move { counter.count_morae("みずのおと").await }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 5);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(counter.is_ready());
    }

    #[tokio::test]
    async fn test_loader_failure_is_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_in_loader = Arc::clone(&attempts);
        let counter = MoraCounter::with_loader(move || {
            attempts_in_loader.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("dictionary missing"))
        });

        for _ in 0..5 {
            assert_eq!(counter.count_morae("あいう").await, 0);
        }
        assert!(counter.warm_up().await.is_err());
        assert!(!counter.is_ready());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
