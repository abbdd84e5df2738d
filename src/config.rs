//! Runtime settings for the simulation scheduler.

use crate::game::constants::sim::DEFAULT_FREQUENCY;

/// Game settings
#[derive(Debug, Clone)]
pub struct GameSettings {
    /// Fixed update rate in Hz
    pub frequency: f64,
    /// Record per-phase and per-controller wall-clock costs
    pub perf_tracker: bool,
    /// Pace frames to `realtime / multiplier`; 0 runs as fast as possible
    pub realtime_multiplier: f64,
    /// Call the graphics sink every Nth frame
    pub frame_skip: u64,
    /// Fallback time limit when the scenario does not set one (seconds)
    pub time_limit: f64,
    /// Randomize asteroid split angles instead of the fixed half-bound fan
    pub random_ast_splits: bool,
    /// Rebuild the controller snapshot for every invocation so each
    /// controller sees identical frame-start data; off shares one snapshot
    /// per frame
    pub competition_safe_mode: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY,
            perf_tracker: false,
            realtime_multiplier: 0.0,
            frame_skip: 1,
            time_limit: f64::INFINITY,
            random_ast_splits: false,
            competition_safe_mode: true,
        }
    }
}

impl GameSettings {
    /// Load settings from environment variables or use defaults
    pub fn load_or_default() -> Self {
        let mut settings = Self::default();

        if let Ok(frequency) = std::env::var("ASTERION_FREQUENCY") {
            match frequency.parse::<f64>() {
                Ok(parsed) if parsed > 0.0 && parsed.is_finite() => settings.frequency = parsed,
                _ => tracing::warn!("Invalid ASTERION_FREQUENCY '{}', using default", frequency),
            }
        }

        if let Ok(multiplier) = std::env::var("ASTERION_REALTIME_MULTIPLIER") {
            match multiplier.parse::<f64>() {
                Ok(parsed) if parsed >= 0.0 && parsed.is_finite() => {
                    settings.realtime_multiplier = parsed;
                }
                _ => tracing::warn!(
                    "Invalid ASTERION_REALTIME_MULTIPLIER '{}', using default",
                    multiplier
                ),
            }
        }

        if let Ok(frame_skip) = std::env::var("ASTERION_FRAME_SKIP") {
            match frame_skip.parse::<u64>() {
                Ok(parsed) if parsed >= 1 => settings.frame_skip = parsed,
                _ => tracing::warn!("Invalid ASTERION_FRAME_SKIP '{}', using default", frame_skip),
            }
        }

        if let Ok(perf) = std::env::var("ASTERION_PERF_TRACKER") {
            match perf.parse::<bool>() {
                Ok(parsed) => settings.perf_tracker = parsed,
                _ => tracing::warn!("Invalid ASTERION_PERF_TRACKER '{}', using default", perf),
            }
        }

        settings
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.frequency <= 0.0 || !self.frequency.is_finite() {
            return Err("frequency must be a positive finite number".to_string());
        }
        if self.frame_skip == 0 {
            return Err("frame_skip must be at least 1".to_string());
        }
        if self.realtime_multiplier < 0.0 || self.realtime_multiplier.is_nan() {
            return Err("realtime_multiplier must be >= 0".to_string());
        }
        if self.time_limit <= 0.0 || self.time_limit.is_nan() {
            return Err("time_limit must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = GameSettings::default();
        assert_eq!(settings.frequency, 30.0);
        assert_eq!(settings.frame_skip, 1);
        assert_eq!(settings.realtime_multiplier, 0.0);
        assert!(settings.competition_safe_mode);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = GameSettings::default();
        settings.frequency = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = GameSettings::default();
        settings.frame_skip = 0;
        assert!(settings.validate().is_err());

        let mut settings = GameSettings::default();
        settings.realtime_multiplier = -1.0;
        assert!(settings.validate().is_err());
    }
}
