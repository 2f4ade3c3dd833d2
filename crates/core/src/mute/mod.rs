use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{storage::KeyValueStore, store::Store, Result, Subscription};

/// Storage key holding the serialized mute flag.
pub const MUTE_STORAGE_KEY: &str = "quizAppMuted";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteState {
    pub is_muted: bool,
}

/// Observable mute flag backed by a [`KeyValueStore`].
#[derive(Clone)]
pub struct MuteStore {
    state: Store<MuteState>,
    storage: Arc<dyn KeyValueStore>,
}

impl MuteStore {
    /// Reads the persisted flag; a missing or unreadable value means unmuted.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let is_muted = match storage.get_item(MUTE_STORAGE_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<bool>(&raw).unwrap_or_else(|err| {
                tracing::warn!(%err, raw = %raw, "ignoring unparseable mute flag");
                false
            }),
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(%err, "could not read mute flag");
                false
            }
        };

        Self {
            state: Store::new(MuteState { is_muted }),
            storage,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.state.with(|state| state.is_muted)
    }

    /// Flips the flag, persists it and notifies subscribers. Returns the new
    /// value.
    pub fn toggle_mute(&self) -> Result<bool> {
        let next = !self.is_muted();
        self.storage
            .set_item(MUTE_STORAGE_KEY, &serde_json::to_string(&next)?)?;
        self.state.set(MuteState { is_muted: next });
        tracing::debug!(is_muted = next, "mute toggled");
        Ok(next)
    }

    pub fn subscribe(&self, f: impl Fn(&MuteState) + Send + Sync + 'static) -> Subscription {
        self.state.subscribe(f)
    }
}

impl std::fmt::Debug for MuteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MuteStore")
            .field("is_muted", &self.is_muted())
            .finish()
    }
}
