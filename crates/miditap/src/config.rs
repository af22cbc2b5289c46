use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Persisted aggregator settings stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiSettings {
    /// Client name announced to the platform MIDI service.
    pub client_name: String,
    /// Milliseconds the polling consumer sleeps between frames.
    pub poll_interval_ms: u64,
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            client_name: "miditap".into(),
            poll_interval_ms: 16,
        }
    }
}

fn settings_path() -> Option<PathBuf> {
    let mut base = dirs::config_dir()?;
    base.push("miditap");
    if !base.exists() {
        let _ = fs::create_dir_all(&base);
    }
    base.push("settings.json");
    Some(base)
}

/// Load settings from disk. Returns defaults if loading fails.
pub fn load() -> MidiSettings {
    let Some(path) = settings_path() else {
        return MidiSettings::default();
    };
    match fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
        Err(_) => MidiSettings::default(),
    }
}

/// Save settings to disk.
pub fn save(settings: &MidiSettings) {
    let Some(path) = settings_path() else {
        return;
    };
    if let Ok(json) = serde_json::to_string_pretty(settings) {
        if let Err(err) = fs::write(&path, json) {
            tracing::warn!(?err, "failed to write miditap settings");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_as_json() {
        let settings = MidiSettings {
            client_name: "test-client".into(),
            poll_interval_ms: 8,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: MidiSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn defaults_match_the_frame_protocol() {
        let settings = MidiSettings::default();
        assert_eq!(settings.poll_interval_ms, 16);
        assert_eq!(settings.client_name, "miditap");
    }
}
