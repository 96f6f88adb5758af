pub mod annotator;
pub mod detector;
pub mod monitor;
pub mod mora;
pub mod normalizer;
pub mod script;
pub mod segmenter;
pub mod store;

// Re-export main types for convenient access
pub use detector::{SenryuDetector, SenryuMatch, SENRYU_PATTERN};
pub use mora::MoraCounter;

// Re-export annotator contract for custom analyzers
pub use annotator::{LinderaAnnotator, PhoneticAnnotator, Token};

// Re-export integration layer types
pub use monitor::{ChannelRegistry, ChatMessage, MessageOutcome, MonitorConfig, SenryuMonitor};
pub use store::{SenryuRecord, SenryuStore};
