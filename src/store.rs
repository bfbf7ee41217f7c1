use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teloxide::types::ChatId;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::picker::{self, Cooldown, PickOutcome};
use crate::stats::{self, ChatStats};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid data file: {0}")]
    Json(#[from] serde_json::Error),
}

/// One pick: two administrators chosen together at the same instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PickRecord {
    pub first: String,
    pub second: String,
    pub timestamp: f64,
}

#[derive(Default)]
struct State {
    history: HashMap<ChatId, Vec<PickRecord>>,
    last_pick: HashMap<ChatId, f64>,
}

/// On-disk layout. Chat ids are strings because JSON object keys cannot be
/// integers; each record flattens into two `[name, timestamp]` pairs that
/// share a timestamp.
#[derive(Serialize, Deserialize)]
struct DataFile {
    #[serde(default)]
    history: BTreeMap<String, Vec<(String, f64)>>,
    #[serde(default)]
    last_pick: BTreeMap<String, f64>,
}

/// Pick history of all chats, mirrored to a JSON file after every mutation.
#[derive(Clone)]
pub struct PickStore {
    path: PathBuf,
    state: Arc<Mutex<State>>,
}

impl PickStore {
    /// Reads the data file, starting empty if it is missing or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match Self::read(&path) {
            Ok(Some(state)) => {
                log::info!("Loaded data from {}", path.display());
                state
            }
            Ok(None) => {
                log::info!("Data file {} not found, starting fresh", path.display());
                State::default()
            }
            Err(e) => {
                log::error!("Failed to load data from {}: {e}", path.display());
                State::default()
            }
        };

        Self {
            path,
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn read(path: &Path) -> Result<Option<State>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(path)?;
        let data: DataFile = serde_json::from_str(&raw)?;

        let mut state = State::default();

        for (key, entries) in data.history {
            let Ok(id) = key.parse() else {
                log::warn!("Invalid chat id in data file, skipping: {key}");
                continue;
            };

            let mut records = Vec::with_capacity(entries.len() / 2);
            let mut pairs = entries.chunks_exact(2);
            for pair in &mut pairs {
                let (first, timestamp) = &pair[0];
                let (second, second_ts) = &pair[1];
                if timestamp != second_ts {
                    log::warn!("Unpaired timestamps in history of chat {id}");
                }
                records.push(PickRecord {
                    first: first.clone(),
                    second: second.clone(),
                    timestamp: *timestamp,
                });
            }
            if !pairs.remainder().is_empty() {
                log::warn!("Odd number of history entries for chat {id}, dropping the last one");
            }

            state.history.insert(ChatId(id), records);
        }

        for (key, timestamp) in data.last_pick {
            let Ok(id) = key.parse() else {
                log::warn!("Invalid chat id in data file, skipping: {key}");
                continue;
            };
            state.last_pick.insert(ChatId(id), timestamp);
        }

        Ok(Some(state))
    }

    fn write(&self, state: &State) -> Result<(), StoreError> {
        let mut history = BTreeMap::new();
        for (chat_id, records) in &state.history {
            let mut entries = Vec::with_capacity(records.len() * 2);
            for record in records {
                entries.push((record.first.clone(), record.timestamp));
                entries.push((record.second.clone(), record.timestamp));
            }
            history.insert(chat_id.0.to_string(), entries);
        }

        let last_pick = state
            .last_pick
            .iter()
            .map(|(chat_id, timestamp)| (chat_id.0.to_string(), *timestamp))
            .collect();

        let json = serde_json::to_string_pretty(&DataFile { history, last_pick })?;

        // temp file + rename, so a crash mid-write cannot tear the file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        Ok(())
    }

    /// Flushes the current state to disk, best-effort.
    pub async fn save(&self) {
        let state = self.state.lock().await;
        match self.write(&state) {
            Ok(()) => log::info!("Data saved to {}", self.path.display()),
            Err(e) => log::error!("Failed to save data to {}: {e}", self.path.display()),
        }
    }

    /// Returns the active cooldown of `chat_id`, if any.
    pub async fn cooldown(&self, chat_id: ChatId, now: DateTime<Utc>) -> Option<Cooldown> {
        let state = self.state.lock().await;
        picker::cooldown_status(
            state.history.get(&chat_id).map_or(&[][..], Vec::as_slice),
            state.last_pick.get(&chat_id).copied(),
            now,
        )
    }

    /// Tries to pick a pair from `candidates` for `chat_id`. The cooldown is
    /// checked under the lock, so concurrent attempts on the same chat
    /// cannot both succeed. A successful pick is persisted immediately; a
    /// failed write is logged and the in-memory state kept.
    pub async fn attempt_pick(
        &self,
        chat_id: ChatId,
        now: DateTime<Utc>,
        candidates: &[String],
    ) -> PickOutcome {
        let mut state = self.state.lock().await;

        if let Some(cooldown) = picker::cooldown_status(
            state.history.get(&chat_id).map_or(&[][..], Vec::as_slice),
            state.last_pick.get(&chat_id).copied(),
            now,
        ) {
            return PickOutcome::OnCooldown(cooldown);
        }

        let Some((first, second)) = picker::sample_pair(candidates, &mut rand::rng()) else {
            return PickOutcome::NotEnoughCandidates;
        };

        let timestamp = stats::epoch(now);
        state.history.entry(chat_id).or_default().push(PickRecord {
            first: first.clone(),
            second: second.clone(),
            timestamp,
        });
        state.last_pick.insert(chat_id, timestamp);

        if let Err(e) = self.write(&state) {
            log::error!("Failed to save data to {}: {e}", self.path.display());
        }

        PickOutcome::Picked { first, second }
    }

    /// Aggregated statistics of `chat_id`, or `None` if the chat has no
    /// recorded picks at all.
    pub async fn stats(&self, chat_id: ChatId, now: DateTime<Utc>) -> Option<ChatStats> {
        let state = self.state.lock().await;
        let history = state.history.get(&chat_id)?;
        if history.is_empty() {
            return None;
        }
        Some(stats::compute(history, now))
    }
}
