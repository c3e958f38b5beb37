use std::cmp;

/// Calibration of a moisture sensor in raw sensor units.
///
/// `dry_value` is what the sensor reports in completely dry soil and
/// `optimal_value` what it reports when the soil is ideally moist.  Most
/// capacitive probes read *higher* when drier, which is the default wiring
/// assumption, but the direction is derived from the two values: if
/// `dry_value < optimal_value` lower readings are treated as drier.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct Calibration {
    pub dry_value: i32,
    pub optimal_value: i32,
    /// Where between `optimal_value` (0.0) and `dry_value` (1.0) watering kicks in.
    pub trigger_point: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    HigherIsDrier,
    LowerIsDrier,
}

#[derive(Debug, Fail, PartialEq)]
pub enum CalibrationError {
    #[fail(display = "trigger point {} is outside of [0, 1]", _0)]
    TriggerPointOutOfRange(f64),
    #[fail(display = "dry value and optimal value are both {}, the calibrated range is empty", _0)]
    EmptyRange(i32),
}

impl Calibration {
    pub fn new(dry_value: i32, optimal_value: i32, trigger_point: f64) -> Self {
        Calibration {
            dry_value,
            optimal_value,
            trigger_point,
        }
    }

    pub fn validate(&self) -> Result<(), CalibrationError> {
        if !(self.trigger_point >= 0.0 && self.trigger_point <= 1.0) {
            return Err(CalibrationError::TriggerPointOutOfRange(self.trigger_point));
        }
        if self.dry_value == self.optimal_value {
            return Err(CalibrationError::EmptyRange(self.dry_value));
        }
        Ok(())
    }

    pub fn polarity(&self) -> Polarity {
        if self.dry_value < self.optimal_value {
            Polarity::LowerIsDrier
        } else {
            Polarity::HigherIsDrier
        }
    }

    /// The raw reading beyond which the soil counts as dry enough to water.
    ///
    /// Always derived from the current calibration, truncated toward zero.
    pub fn threshold(&self) -> i32 {
        let span = (i64::from(self.dry_value) - i64::from(self.optimal_value)) as f64;
        (f64::from(self.dry_value) - span * self.trigger_point) as i32
    }

    /// Whether `level` is strictly drier than the threshold.
    pub fn is_drier(&self, level: i32) -> bool {
        let threshold = self.threshold();
        match self.polarity() {
            Polarity::HigherIsDrier => level > threshold,
            Polarity::LowerIsDrier => level < threshold,
        }
    }

    /// Maps a raw reading to 0 (dry) ..= 100 (optimal).
    pub fn percentage(&self, raw: i32) -> i32 {
        let lo = cmp::min(self.optimal_value, self.dry_value);
        let hi = cmp::max(self.optimal_value, self.dry_value);
        let clamped = cmp::max(lo, cmp::min(hi, raw));

        map_range(clamped, self.dry_value, self.optimal_value, 0, 100)
    }
}

/// Integer linear interpolation of `x` from `[in_min, in_max]` onto
/// `[out_min, out_max]`.  Either range may be descending.  The quotient
/// truncates toward zero; an empty input range maps everything to `out_min`.
pub fn map_range(x: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_min == in_max {
        return out_min;
    }

    let numerator = (i64::from(x) - i64::from(in_min)) * (i64::from(out_max) - i64::from(out_min));
    let denominator = i64::from(in_max) - i64::from(in_min);

    (numerator / denominator + i64::from(out_min)) as i32
}
