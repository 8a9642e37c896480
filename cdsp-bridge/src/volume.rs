//! Conversion between the UI volume level in `[0, 1]` and CamillaDSP's attenuation in dB.

use crate::error::ConfigError;

/// Lowest attenuation a volume bound may be configured to.
pub const VOLUME_DB_FLOOR: f64 = -100.0;
/// Largest configurable volume step in dB.
pub const VOLUME_STEP_DB_LIMIT: f64 = 100.0;

/// Configured attenuation window, both bounds non-positive and `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeRange {
    min: f64,
    max: f64,
    step_db: f64,
}

impl VolumeRange {
    pub fn new(min: f64, max: f64, step_db: f64) -> Result<Self, ConfigError> {
        for (field, value) in [("volume.min", min), ("volume.max", max)] {
            if !(VOLUME_DB_FLOOR..=0.0).contains(&value) {
                return Err(ConfigError::invalid_value(
                    field,
                    format!("{value} dB is outside of [{VOLUME_DB_FLOOR}, 0] dB"),
                ));
            }
        }
        if min > max {
            return Err(ConfigError::invalid_value(
                "volume.min",
                format!("{min} dB is above the maximum of {max} dB"),
            ));
        }
        if !(0.0..=VOLUME_STEP_DB_LIMIT).contains(&step_db) {
            return Err(ConfigError::invalid_value(
                "volume.step",
                format!("{step_db} dB is outside of [0, {VOLUME_STEP_DB_LIMIT}] dB"),
            ));
        }
        Ok(Self { min, max, step_db })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step_db(&self) -> f64 {
        self.step_db
    }

    /// Width of the window in dB.
    pub fn width(&self) -> f64 {
        (self.max - self.min).abs()
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0
    }
}

impl Default for VolumeRange {
    fn default() -> Self {
        Self {
            min: -50.0,
            max: 0.0,
            step_db: 1.0,
        }
    }
}

/// Maps UI volume levels onto a [`VolumeRange`] and back.
///
/// All results are rounded to two decimals, so `from_db(to_db(level))` yields `level` rounded to two
/// decimals on any non-degenerate range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeConverter {
    range: VolumeRange,
    step: f64,
}

impl VolumeConverter {
    pub fn new(range: VolumeRange) -> Self {
        let mut converter = Self { range, step: 0.0 };
        converter.step = converter.step_fraction(range.step_db);
        converter
    }

    pub fn range(&self) -> &VolumeRange {
        &self.range
    }

    /// UI step derived from the configured dB step.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Converts a UI level into dB. Levels outside `[0, 1]` are clamped, non-finite ones map to the
    /// range minimum.
    pub fn to_db(&self, level: f64) -> f64 {
        if !level.is_finite() || self.range.is_degenerate() {
            return self.range.min;
        }
        round2(self.range.min + level.clamp(0.0, 1.0) * self.range.width())
    }

    /// Converts an attenuation into a UI level. Values outside the range clamp to `0` or `1`,
    /// non-finite ones map to `0`.
    pub fn from_db(&self, volume_db: f64) -> f64 {
        if !volume_db.is_finite() || self.range.is_degenerate() {
            return 0.0;
        }
        round2((volume_db - self.range.min) / self.range.width()).clamp(0.0, 1.0)
    }

    /// Converts a dB step into a UI step. A non-positive step disables stepping (`0`), a step wider
    /// than the whole range covers it in one go (`1`).
    pub fn step_fraction(&self, step_db: f64) -> f64 {
        if step_db.is_nan() || step_db <= 0.0 {
            return 0.0;
        }
        let width = self.range.width();
        if width < step_db {
            return 1.0;
        }
        round2(step_db / width)
    }
}

impl Default for VolumeConverter {
    fn default() -> Self {
        Self::new(VolumeRange::default())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
