//! Engine settings loading
//!
//! The engine reads one settings snapshot per cycle through this seam.
//! A load failure is fatal to the cycle; running on stale or guessed
//! settings is worse than not running.

use std::sync::Mutex;

use types::errors::ConfigError;
use types::settings::EngineSettings;

/// Source of the per-cycle settings snapshot.
pub trait SettingsProvider: Send + Sync {
    fn load(&self) -> Result<EngineSettings, ConfigError>;
}

/// Settings held in memory, mutable through the admin surface.
#[derive(Debug, Default)]
pub struct StaticSettings {
    current: Mutex<EngineSettings>,
}

impl StaticSettings {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            current: Mutex::new(settings),
        }
    }

    /// Replace the settings; the next cycle sees the new snapshot.
    pub fn set(&self, settings: EngineSettings) {
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *current = settings;
    }
}

impl SettingsProvider for StaticSettings {
    fn load(&self) -> Result<EngineSettings, ConfigError> {
        let current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_settings_snapshot() {
        let provider = StaticSettings::new(EngineSettings::default());
        let snapshot = provider.load().unwrap();
        assert!(snapshot.matching_allowed());

        provider.set(EngineSettings {
            circuit_breaker_active: true,
            ..EngineSettings::default()
        });
        assert!(!provider.load().unwrap().matching_allowed());
        // The earlier snapshot is unaffected
        assert!(snapshot.matching_allowed());
    }
}
