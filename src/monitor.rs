// WHY: message-level policy a chat gateway adapter calls for every incoming message
// Channel membership is injected through ChannelRegistry so the monitor holds no global state

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::detector::{SenryuDetector, SenryuMatch};
use crate::store::SenryuRecord;

/// Reaction added to a message containing a senryu
pub const DETECTED_REACTION: &str = "🔖";

/// Guild id recorded for messages outside any guild
pub const DIRECT_MESSAGE_GUILD: &str = "DM";

/// Incoming chat message as delivered by the gateway adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub author_id: String,
    #[serde(default)]
    pub author_is_bot: bool,
    #[serde(default)]
    pub content: String,
}

/// Answers whether detection is enabled for a channel
pub trait ChannelRegistry {
    fn is_monitored(&self, channel_id: &str) -> bool;
}

/// Limits the caller places around a detection run
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Skip messages longer than this many characters
    pub max_chars: Option<usize>,
    /// Stop waiting for a detection after this long; the search itself keeps running
    pub timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_chars: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// What happened to a single message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    IgnoredBot,
    NotMonitored,
    Empty,
    TooLong { chars: usize },
    TimedOut,
    NoMatch,
    Detected(SenryuRecord),
}

/// Routes chat messages through the detector
pub struct SenryuMonitor {
    detector: Arc<SenryuDetector>,
    config: MonitorConfig,
}

impl SenryuMonitor {
    pub fn new(detector: Arc<SenryuDetector>, config: MonitorConfig) -> Self {
        Self { detector, config }
    }

    /// Apply the message policy and run detection. The returned record is not persisted.
    pub async fn handle(&self, message: &ChatMessage, registry: &dyn ChannelRegistry) -> MessageOutcome {
        if message.author_is_bot {
            return MessageOutcome::IgnoredBot;
        }
        if !registry.is_monitored(&message.channel_id) {
            return MessageOutcome::NotMonitored;
        }
        if message.content.is_empty() {
            return MessageOutcome::Empty;
        }

        let chars = message.content.chars().count();
        if let Some(max_chars) = self.config.max_chars {
            if chars > max_chars {
                debug!("Skipping message {}: {} chars exceeds limit {}", message.id, chars, max_chars);
                return MessageOutcome::TooLong { chars };
            }
        }

        // Detection runs as its own task so a timeout abandons it without cancelling mid-search
        let detector = Arc::clone(&self.detector);
        let content = message.content.clone();
        let task = tokio::spawn(async move { detector.detect(&content).await });

        match tokio::time::timeout(self.config.timeout, task).await {
            Ok(Ok(Some(found))) => MessageOutcome::Detected(SenryuRecord::from_message(message, found)),
            Ok(Ok(None)) => MessageOutcome::NoMatch,
            Ok(Err(err)) => {
                warn!("Detection task for message {} failed: {}", message.id, err);
                MessageOutcome::NoMatch
            }
            Err(_) => {
                warn!(
                    "Detection for message {} exceeded {}ms, abandoning",
                    message.id,
                    self.config.timeout.as_millis()
                );
                MessageOutcome::TimedOut
            }
        }
    }
}

/// Reply posted under a message containing a senryu
pub fn reply_text(found: &SenryuMatch) -> String {
    format!("川柳を検出しました!\n\n{}\n{}\n{}", found.line1, found.line2, found.line3)
}
