//! JSON-backed store of fetched messages and their processing markers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MailcalError, MailcalResult};
use crate::message::Message;
use crate::pipeline::Outcome;

const STORE_FILE: &str = "messages.json";

/// Result of the last scheduling attempt for a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleMarker {
    pub outcome: Outcome,
    pub link: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub message: Message,
    #[serde(default)]
    pub schedule: Option<ScheduleMarker>,
    #[serde(default)]
    pub replied: bool,
}

impl StoredMessage {
    /// Whether a scheduling attempt reached a final outcome.
    /// Only failures from transient provider errors get retried.
    pub fn is_settled(&self) -> bool {
        self.schedule
            .as_ref()
            .is_some_and(|marker| marker.outcome.is_settled())
    }
}

/// Messages keyed by id, persisted as one JSON document.
#[derive(Debug)]
pub struct MessageStore {
    path: PathBuf,
    messages: BTreeMap<String, StoredMessage>,
}

impl MessageStore {
    /// Default location: `<data dir>/mailcal/messages.json`.
    pub fn default_path() -> MailcalResult<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("mailcal").join(STORE_FILE))
            .ok_or_else(|| MailcalError::Store("Could not determine data directory".into()))
    }

    /// Resolve a configured store path, expanding `~` and environment
    /// variables. `None` means [`MessageStore::default_path`].
    pub fn resolve_path(configured: Option<&str>) -> MailcalResult<PathBuf> {
        match configured {
            Some(raw) => {
                let expanded = shellexpand::full(raw).map_err(|e| {
                    MailcalError::Config(format!("Invalid store_path '{}': {}", raw, e))
                })?;
                Ok(PathBuf::from(expanded.as_ref()))
            }
            None => Self::default_path(),
        }
    }

    /// Open the store at `path`. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> MailcalResult<Self> {
        let path = path.into();

        let messages = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| {
                MailcalError::Store(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, messages })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole store, replacing the file atomically.
    pub fn save(&self) -> MailcalResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.messages)
            .map_err(|e| MailcalError::Serialization(e.to_string()))?;

        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    /// Add a message unless one with the same id is already stored.
    /// Returns true if it was added.
    pub fn insert_if_new(&mut self, message: Message) -> bool {
        if self.messages.contains_key(&message.id) {
            return false;
        }
        self.messages.insert(
            message.id.clone(),
            StoredMessage {
                message,
                schedule: None,
                replied: false,
            },
        );
        true
    }

    pub fn get(&self, id: &str) -> Option<&StoredMessage> {
        self.messages.get(id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages without a settled scheduling outcome, oldest first.
    pub fn pending(&self) -> Vec<Message> {
        self.sorted()
            .into_iter()
            .filter(|stored| !stored.is_settled())
            .map(|stored| stored.message.clone())
            .collect()
    }

    /// Messages not yet answered, oldest first.
    pub fn unreplied(&self) -> Vec<&StoredMessage> {
        self.sorted()
            .into_iter()
            .filter(|stored| !stored.replied)
            .collect()
    }

    /// Most recently received message.
    pub fn latest(&self) -> Option<&StoredMessage> {
        self.sorted().pop()
    }

    pub fn record_outcome(
        &mut self,
        id: &str,
        outcome: Outcome,
        attempted_at: DateTime<Utc>,
    ) -> MailcalResult<()> {
        let stored = self.get_mut(id)?;
        stored.schedule = Some(ScheduleMarker {
            link: outcome.link().map(String::from),
            outcome,
            attempted_at,
        });
        Ok(())
    }

    pub fn mark_replied(&mut self, id: &str) -> MailcalResult<()> {
        self.get_mut(id)?.replied = true;
        Ok(())
    }

    fn get_mut(&mut self, id: &str) -> MailcalResult<&mut StoredMessage> {
        self.messages
            .get_mut(id)
            .ok_or_else(|| MailcalError::Store(format!("Unknown message '{}'", id)))
    }

    // Undated messages sort first, then by received time, then id
    fn sorted(&self) -> Vec<&StoredMessage> {
        let mut messages: Vec<_> = self.messages.values().collect();
        messages.sort_by(|a, b| {
            a.message
                .received_at
                .cmp(&b.message.received_at)
                .then_with(|| a.message.id.cmp(&b.message.id))
        });
        messages
    }
}
