use failure;
use slog;

use calibration;

/// 12 hours.
pub const DEFAULT_MIN_TIME_BETWEEN_WATERINGS_MS: u64 = 43_200_000;
pub const SAMPLE_COUNT: u32 = 3;
pub const SAMPLE_INTERVAL_MS: u64 = 10;

/// Something that waters: a pump, a solenoid valve, ...
pub trait Actuator {
    fn set_active(&mut self, active: bool) -> Result<(), failure::Error>;
}

pub trait MoistureSensor {
    fn read_raw(&mut self) -> Result<i32, failure::Error>;
}

/// A monotonic millisecond clock that can also block the calling thread.
pub trait Clock {
    fn now_ms(&self) -> u64;
    fn sleep_ms(&self, ms: u64);
}

/// `Watering` holds for as long as the actuator may still be active: during
/// `water()`, and afterwards until a failed shutoff has been retried
/// successfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Watering,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match *self {
            State::Idle => "idle",
            State::Watering => "watering",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub raw_moisture: i32,
    pub moisture_percentage: i32,
    pub moisture_threshold: i32,
    pub needs_water: bool,
}

pub struct MoistureController<A, S, C> {
    log: slog::Logger,
    actuator: A,
    sensor: S,
    clock: C,
    calibration: calibration::Calibration,
    watering_duration_ms: u64,
    min_time_between_waterings_ms: u64,
    last_watering_time_ms: u64,
    state: State,
}

impl<A, S, C> MoistureController<A, S, C>
where
    A: Actuator,
    S: MoistureSensor,
    C: Clock,
{
    pub fn new(
        log: slog::Logger,
        mut actuator: A,
        sensor: S,
        clock: C,
        calibration: calibration::Calibration,
        watering_duration_ms: u64,
    ) -> Result<Self, failure::Error> {
        calibration.validate()?;
        actuator.set_active(false)?;

        debug!(log, "created moisture controller";
               "dry_value" => calibration.dry_value,
               "optimal_value" => calibration.optimal_value,
               "trigger_point" => calibration.trigger_point,
               "threshold" => calibration.threshold(),
               "watering_duration_ms" => watering_duration_ms);

        Ok(MoistureController {
            log,
            actuator,
            sensor,
            clock,
            calibration,
            watering_duration_ms,
            min_time_between_waterings_ms: DEFAULT_MIN_TIME_BETWEEN_WATERINGS_MS,
            last_watering_time_ms: 0,
            state: State::Idle,
        })
    }

    pub fn with_min_time_between_waterings(mut self, ms: u64) -> Self {
        self.min_time_between_waterings_ms = ms;
        self
    }

    pub fn calibration(&self) -> &calibration::Calibration {
        &self.calibration
    }

    pub fn set_calibration(
        &mut self,
        calibration: calibration::Calibration,
    ) -> Result<(), failure::Error> {
        calibration.validate()?;
        info!(self.log, "recalibrated";
              "dry_value" => calibration.dry_value,
              "optimal_value" => calibration.optimal_value,
              "trigger_point" => calibration.trigger_point,
              "threshold" => calibration.threshold());
        self.calibration = calibration;
        Ok(())
    }

    pub fn moisture_threshold(&self) -> i32 {
        self.calibration.threshold()
    }

    pub fn last_watering_time_ms(&self) -> u64 {
        self.last_watering_time_ms
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Averages a few samples to damp ADC noise.  Pauses after every sample.
    pub fn read_moisture(&mut self) -> Result<i32, failure::Error> {
        let mut sum = 0i64;
        for _ in 0..SAMPLE_COUNT {
            sum += i64::from(self.sensor.read_raw()?);
            self.clock.sleep_ms(SAMPLE_INTERVAL_MS);
        }
        Ok((sum / i64::from(SAMPLE_COUNT)) as i32)
    }

    pub fn moisture_percentage(&mut self) -> Result<i32, failure::Error> {
        let raw = self.read_moisture()?;
        Ok(self.calibration.percentage(raw))
    }

    pub fn sample(&mut self) -> Result<Sample, failure::Error> {
        let raw_moisture = self.read_moisture()?;
        Ok(Sample {
            raw_moisture,
            moisture_percentage: self.calibration.percentage(raw_moisture),
            moisture_threshold: self.calibration.threshold(),
            needs_water: self.calibration.is_drier(raw_moisture),
        })
    }

    /// Runs the actuator for the configured duration.  Blocks until done.
    ///
    /// If the actuator cannot be switched off (or on, in which case its level
    /// is unknown) the controller stays `Watering` and every `update()`
    /// retries the shutoff first.
    pub fn water(&mut self) -> Result<(), failure::Error> {
        info!(self.log, "watering"; "duration_ms" => self.watering_duration_ms);

        self.state = State::Watering;
        self.actuator.set_active(true)?;
        self.clock.sleep_ms(self.watering_duration_ms);
        self.stop()?;

        debug!(self.log, "watering done");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), failure::Error> {
        self.actuator.set_active(false)?;
        self.state = State::Idle;
        Ok(())
    }

    /// Waters if the soil is too dry and the cooldown has passed.  Returns
    /// whether watering happened.
    pub fn update(&mut self) -> Result<bool, failure::Error> {
        if self.state == State::Watering {
            warn!(self.log, "actuator may still be active, switching it off");
            self.stop()?;
            info!(self.log, "actuator switched off");
        }

        let moisture = self.read_moisture()?;
        let now = self.clock.now_ms();
        let since_last_watering = now.saturating_sub(self.last_watering_time_ms);

        debug!(self.log, "moisture check";
               "state" => self.state.as_str(),
               "moisture" => moisture,
               "threshold" => self.calibration.threshold(),
               "since_last_watering_ms" => since_last_watering);

        if !self.calibration.is_drier(moisture) {
            return Ok(false);
        }

        if since_last_watering <= self.min_time_between_waterings_ms {
            debug!(self.log, "soil is dry but still cooling down";
                   "remaining_ms" => self.min_time_between_waterings_ms - since_last_watering);
            return Ok(false);
        }

        // The cooldown starts when watering ends, even if it ended badly.
        let result = self.water();
        self.last_watering_time_ms = self.clock.now_ms();
        if let Err(ref e) = result {
            error!(self.log, "watering failed"; "error" => e.to_string());
        }
        result.map(|()| true)
    }
}
