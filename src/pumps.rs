use failure;
use slog;
use sysfs_gpio;

use controller;

pub struct Pump {
    log: slog::Logger,
    pin: sysfs_gpio::Pin,
    active_low: bool,
}

impl Pump {
    /// Exports `pin` and configures it as an output, initially off.
    pub fn new(log: slog::Logger, pin: u64, active_low: bool) -> Result<Self, failure::Error> {
        let pin = sysfs_gpio::Pin::new(pin);
        pin.export()?;
        pin.set_direction(if active_low {
            sysfs_gpio::Direction::High
        } else {
            sysfs_gpio::Direction::Low
        })?;

        debug!(log, "exported pump pin"; "pin" => pin.get_pin(), "active_low" => active_low);

        Ok(Pump {
            log,
            pin,
            active_low,
        })
    }

    pub fn set_running(&self, running: bool) -> Result<(), failure::Error> {
        self.pin.set_value(level(running, self.active_low))?;
        Ok(())
    }
}

impl controller::Actuator for Pump {
    fn set_active(&mut self, active: bool) -> Result<(), failure::Error> {
        self.set_running(active)?;
        debug!(self.log, "pump switched"; "running" => active);
        Ok(())
    }
}

impl Drop for Pump {
    fn drop(&mut self) {
        if let Err(e) = self.set_running(false) {
            error!(self.log, "Could not stop pump on pin {}: {}", self.pin.get_pin(), e);
        }
        if let Err(e) = self.pin.unexport() {
            error!(self.log, "Could not unexport pin {}: {}", self.pin.get_pin(), e);
        }
    }
}

fn level(running: bool, active_low: bool) -> u8 {
    if running != active_low {
        1
    } else {
        0
    }
}
