use std::sync;

use ads1x15;
use failure;
use i2cdev;
use slog;

use futures::Future;

use controller;

/// A single-ended input on an ADS1115 analog-to-digital converter.
///
/// Raw readings are the input voltage in millivolts, so calibration values
/// are millivolts too.
pub struct Ads1115<D> {
    log: slog::Logger,
    device: sync::Arc<ads1x15::Ads1x15<D>>,
    channel: ads1x15::Channel,
    analog_pin: u8,
}

impl<D> Ads1115<D>
where
    D: i2cdev::core::I2CDevice + Send + 'static,
    <D as i2cdev::core::I2CDevice>::Error: Send + Sync + 'static,
{
    pub fn new(log: slog::Logger, device: D, analog_pin: u8) -> Result<Self, failure::Error> {
        let channel = channel(analog_pin)?;
        let device = sync::Arc::new(ads1x15::Ads1x15::new_ads1115(device));
        Ok(Ads1115 {
            log,
            device,
            channel,
            analog_pin,
        })
    }

    pub fn sample(&self) -> Result<f32, failure::Error> {
        let volts = self.device.clone().read_single_ended(self.channel).wait()?;
        trace!(self.log, "sampled ADC"; "pin" => self.analog_pin, "volts" => volts);
        Ok(volts)
    }
}

impl<D> controller::MoistureSensor for Ads1115<D>
where
    D: i2cdev::core::I2CDevice + Send + 'static,
    <D as i2cdev::core::I2CDevice>::Error: Send + Sync + 'static,
{
    fn read_raw(&mut self) -> Result<i32, failure::Error> {
        Ok(millivolts(self.sample()?))
    }
}

fn channel(analog_pin: u8) -> Result<ads1x15::Channel, failure::Error> {
    match analog_pin {
        0 => Ok(ads1x15::Channel::A0),
        1 => Ok(ads1x15::Channel::A1),
        2 => Ok(ads1x15::Channel::A2),
        3 => Ok(ads1x15::Channel::A3),
        _ => bail!("ADS1115 has no analog input {}, expected 0-3", analog_pin),
    }
}

fn millivolts(volts: f32) -> i32 {
    (f64::from(volts) * 1000.0).round() as i32
}
