use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::capture::CaptureTiming;
use crate::correction::CorrectionConfig;
use crate::pose::PoseKind;
use crate::session::SamplingConfig;
use crate::speech::ArbitratorConfig;

/// Everything a coaching session can be tuned with. Missing fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachSettings {
    pub pose: PoseKind,
    pub correction: CorrectionConfig,
    pub capture: CaptureTiming,
    pub speech: ArbitratorConfig,
    pub sampling: SamplingConfig,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<CoachSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            CoachSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> CoachSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: CoachSettings) -> Result<()> {
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: CoachSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings in {}", self.path.display()))?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &CoachSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    // A writer that panicked left a complete value behind; keep using it.
    fn read(&self) -> RwLockReadGuard<'_, CoachSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CoachSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("posecoach-settings-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let store = SettingsStore::new(temp_path()).unwrap();
        let settings = store.settings();

        assert_eq!(settings.pose, PoseKind::FrontDoubleBiceps);
        assert_eq!(settings.capture.countdown_ms, 3_500);
        assert_eq!(settings.speech.debounce_ms, 2_000);
        assert_eq!(settings.sampling.processing_interval, 15);
    }

    #[test]
    fn test_update_persists_and_reloads() {
        let path = temp_path();
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.settings();
        settings.capture.cooldown_ms = 4_000;
        settings.speech.voice_id = Some("coach".to_string());
        settings.correction.vertical_tolerance = 6.0;
        store.update(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reopened.settings(), settings);

        fs::write(&path, r#"{"capture":{"countdownMs":1000}}"#).unwrap();
        // unknown casing is ignored, everything else defaults
        reopened.reload().unwrap();
        assert_eq!(reopened.settings(), CoachSettings::default());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let path = temp_path();
        fs::write(&path, r#"{"capture":{"countdown_ms":1000},"sampling":{"processing_interval":5}}"#)
            .unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        let settings = store.settings();
        assert_eq!(settings.capture.countdown_ms, 1_000);
        assert_eq!(settings.capture.cooldown_ms, 2_000);
        assert_eq!(settings.sampling.processing_interval, 5);
        assert_eq!(settings.correction, CorrectionConfig::default());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_unparseable_file_falls_back_to_defaults() {
        let path = temp_path();
        fs::write(&path, "not json").unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.settings(), CoachSettings::default());
        assert!(store.reload().is_err());

        let _ = fs::remove_file(path);
    }
}
