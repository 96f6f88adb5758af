// WHY: JSON file store for monitored channels and detected senryu
// Persistence belongs to the caller; the detector never touches this module

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::detector::SenryuMatch;
use crate::monitor::{ChannelRegistry, ChatMessage, DIRECT_MESSAGE_GUILD};

/// Entries shown by the guild listing
pub const RECENT_LIMIT: usize = 10;

/// Authors shown in the guild ranking
pub const TOP_AUTHORS_LIMIT: usize = 5;

/// Entries in the cross-guild record report
pub const OVERALL_RECENT_LIMIT: usize = 20;

/// Entries in the per-guild record report
pub const GUILD_HISTORY_LIMIT: usize = 50;

/// A persisted detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenryuRecord {
    pub guild_id: String,
    pub channel_id: String,
    pub message_id: String,
    pub author_id: String,
    pub line1: String,
    pub line2: String,
    pub line3: String,
    pub detected_at: DateTime<Utc>,
}

impl SenryuRecord {
    pub fn from_message(message: &ChatMessage, found: SenryuMatch) -> Self {
        Self {
            guild_id: message
                .guild_id
                .clone()
                .unwrap_or_else(|| DIRECT_MESSAGE_GUILD.to_string()),
            channel_id: message.channel_id.clone(),
            message_id: message.id.clone(),
            author_id: message.author_id.clone(),
            line1: found.line1,
            line2: found.line2,
            line3: found.line3,
            detected_at: Utc::now(),
        }
    }

    pub fn senryu(&self) -> SenryuMatch {
        SenryuMatch {
            line1: self.line1.clone(),
            line2: self.line2.clone(),
            line3: self.line3.clone(),
        }
    }
}

/// A channel with detection enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSetting {
    pub guild_id: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
}

/// Detections per author, highest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorCount {
    pub author_id: String,
    pub count: usize,
}

/// Totals across every guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallStats {
    pub total_senryu_detected: usize,
    pub total_monitored_channels: usize,
    pub timestamp: DateTime<Utc>,
}

/// Monitored channels across every guild, newest first
#[derive(Debug, Serialize)]
pub struct ChannelReport<'a> {
    pub channels: Vec<&'a ChannelSetting>,
}

/// Latest records of one guild, or of all guilds when `guild_id` is absent
#[derive(Debug, Serialize)]
pub struct RecordReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<&'a str>,
    pub count: usize,
    pub records: Vec<&'a SenryuRecord>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct StoreData {
    #[serde(default)]
    channels: Vec<ChannelSetting>,
    #[serde(default)]
    records: Vec<SenryuRecord>,
}

/// Store backed by a single JSON file, loaded fully into memory
#[derive(Debug)]
pub struct SenryuStore {
    path: PathBuf,
    data: StoreData,
}

impl SenryuStore {
    /// Load the store, starting empty when the file does not exist yet
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let data = match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse store file {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("Store file {} not found, starting empty", path.display());
                StoreData::default()
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read store file {}", path.display()))
            }
        };

        info!(
            "Loaded store {}: {} channels, {} records",
            path.display(),
            data.channels.len(),
            data.records.len()
        );
        Ok(Self { path, data })
    }

    /// Write the store back to its file
    pub async fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.data)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write store file {}", self.path.display()))?;
        Ok(())
    }

    /// Enable detection for a channel. Returns false when it was already enabled.
    pub fn set_channel(&mut self, guild_id: &str, channel_id: &str) -> bool {
        let exists = self
            .data
            .channels
            .iter()
            .any(|c| c.guild_id == guild_id && c.channel_id == channel_id);
        if exists {
            return false;
        }

        self.data.channels.push(ChannelSetting {
            guild_id: guild_id.to_string(),
            channel_id: channel_id.to_string(),
            created_at: Utc::now(),
        });
        true
    }

    /// Disable detection for a channel. Returns false when it was not enabled.
    pub fn unset_channel(&mut self, guild_id: &str, channel_id: &str) -> bool {
        let before = self.data.channels.len();
        self.data
            .channels
            .retain(|c| !(c.guild_id == guild_id && c.channel_id == channel_id));
        self.data.channels.len() != before
    }

    pub fn channels_in_guild(&self, guild_id: &str) -> Vec<&ChannelSetting> {
        self.data
            .channels
            .iter()
            .filter(|c| c.guild_id == guild_id)
            .collect()
    }

    /// Every monitored channel, newest first
    pub fn all_channels(&self) -> Vec<&ChannelSetting> {
        let mut channels: Vec<_> = self.data.channels.iter().collect();
        channels.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        channels
    }

    pub fn add_record(&mut self, record: SenryuRecord) {
        self.data.records.push(record);
    }

    /// Latest records of a guild, newest first
    pub fn recent(&self, guild_id: &str, limit: usize) -> Vec<&SenryuRecord> {
        newest_first(self.data.records.iter().filter(|r| r.guild_id == guild_id), limit)
    }

    /// Latest records across all guilds, newest first
    pub fn recent_all(&self, limit: usize) -> Vec<&SenryuRecord> {
        newest_first(self.data.records.iter(), limit)
    }

    pub fn count(&self, guild_id: &str) -> usize {
        self.data.records.iter().filter(|r| r.guild_id == guild_id).count()
    }

    pub fn total_count(&self) -> usize {
        self.data.records.len()
    }

    pub fn overall_stats(&self) -> OverallStats {
        OverallStats {
            total_senryu_detected: self.total_count(),
            total_monitored_channels: self.data.channels.len(),
            timestamp: Utc::now(),
        }
    }

    pub fn channel_report(&self) -> ChannelReport<'_> {
        ChannelReport {
            channels: self.all_channels(),
        }
    }

    /// Up to `GUILD_HISTORY_LIMIT` records of a guild, or `OVERALL_RECENT_LIMIT` across all guilds
    pub fn record_report<'a>(&'a self, guild_id: Option<&'a str>) -> RecordReport<'a> {
        let records = match guild_id {
            Some(guild_id) => self.recent(guild_id, GUILD_HISTORY_LIMIT),
            None => self.recent_all(OVERALL_RECENT_LIMIT),
        };
        RecordReport {
            guild_id,
            count: records.len(),
            records,
        }
    }

    /// Authors ranked by detections in a guild; ties break by author id
    pub fn top_authors(&self, guild_id: &str, limit: usize) -> Vec<AuthorCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in self.data.records.iter().filter(|r| r.guild_id == guild_id) {
            *counts.entry(record.author_id.as_str()).or_default() += 1;
        }

        let mut ranking: Vec<AuthorCount> = counts
            .into_iter()
            .map(|(author_id, count)| AuthorCount {
                author_id: author_id.to_string(),
                count,
            })
            .collect();
        ranking.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.author_id.cmp(&b.author_id)));
        ranking.truncate(limit);
        ranking
    }
}

impl ChannelRegistry for SenryuStore {
    fn is_monitored(&self, channel_id: &str) -> bool {
        self.data.channels.iter().any(|c| c.channel_id == channel_id)
    }
}

fn newest_first<'a>(records: impl Iterator<Item = &'a SenryuRecord>, limit: usize) -> Vec<&'a SenryuRecord> {
    let mut records: Vec<_> = records.collect();
    // Stable sort keeps insertion order among equal timestamps; reverse puts later inserts first
    records.reverse();
    records.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));
    records.truncate(limit);
    records
}

/// Reply for the channel listing of a guild
pub fn format_channel_list(channels: &[&ChannelSetting]) -> String {
    if channels.is_empty() {
        return "現在監視中のチャンネルはありません。".to_string();
    }
    let list: Vec<String> = channels.iter().map(|c| format!("<#{}>", c.channel_id)).collect();
    format!("**監視中のチャンネル:**\n{}", list.join("\n"))
}

/// Reply listing the latest senryu of a guild
pub fn format_recent_list(records: &[&SenryuRecord]) -> String {
    if records.is_empty() {
        return "まだ川柳が検出されていません。".to_string();
    }

    let entries: Vec<String> = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "**{}.** <@{}> ({})\n{}\n{}\n{}",
                i + 1,
                r.author_id,
                r.detected_at.format("%Y/%m/%d"),
                r.line1,
                r.line2,
                r.line3
            )
        })
        .collect();
    format!("**検出された川柳(最新{}件):**\n\n{}", RECENT_LIMIT, entries.join("\n\n"))
}

/// Reply with the detection statistics of a guild
pub fn format_stats(total: usize, ranking: &[AuthorCount]) -> String {
    let ranking_text = if ranking.is_empty() {
        "データなし".to_string()
    } else {
        ranking
            .iter()
            .enumerate()
            .map(|(i, a)| format!("**{}.** <@{}>: {}句", i + 1, a.author_id, a.count))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "**川柳検出統計**\n\n**総検出数:** {}句\n\n**投稿者ランキング(Top {}):**\n{}",
        total, TOP_AUTHORS_LIMIT, ranking_text
    )
}
