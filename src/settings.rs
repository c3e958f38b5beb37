use std::path;

use config;
use failure;
use serde;
use uuid;

use calibration;
use controller;

pub const ENV_PREFIX: &str = "TRICKLE";

const MAX_I2C_ADDRESS: u8 = 0x7f;
const ADS1115_INPUTS: u8 = 4;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub plant: Plant,
    pub pump: Pump,
    pub sensor: Sensor,
    pub calibration: calibration::Calibration,
    pub watering: Watering,
}

#[derive(Debug, Deserialize)]
pub struct Plant {
    pub id: uuid::Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Pump {
    pub pin: u64,
    #[serde(default)]
    pub active_low: bool,
}

#[derive(Debug, Deserialize)]
pub struct Sensor {
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: String,
    #[serde(deserialize_with = "deserialize_moisture_channel")]
    pub channel: MoistureChannel,
}

#[derive(Debug, Deserialize)]
pub struct Watering {
    pub duration_ms: u64,
    #[serde(default = "default_min_time_between_ms")]
    pub min_time_between_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, PartialEq)]
pub struct MoistureChannel {
    pub i2c_address: u8,
    pub analog_pin: u8,
}

impl Settings {
    /// Reads `path`, then applies `TRICKLE_<SECTION>__<KEY>` environment
    /// overrides.
    pub fn load(path: &path::Path) -> Result<Self, failure::Error> {
        let mut settings = config::Config::new();
        settings.merge(config::File::from(path))?;
        settings.merge(config::Environment::with_prefix(ENV_PREFIX).separator("__"))?;
        Self::from_config(settings)
    }

    fn from_config(settings: config::Config) -> Result<Self, failure::Error> {
        let settings: Settings = settings.try_into()?;
        settings.calibration.validate()?;
        if settings.watering.poll_interval_ms == 0 {
            bail!("watering.poll_interval_ms must be positive");
        }
        Ok(settings)
    }
}

fn default_i2c_bus() -> String {
    "/dev/i2c-1".to_owned()
}

fn default_min_time_between_ms() -> u64 {
    controller::DEFAULT_MIN_TIME_BETWEEN_WATERINGS_MS
}

fn default_poll_interval_ms() -> u64 {
    60_000
}

/// Parses `"<i2c address in hex>-<ADS1115 input>"`, e.g. `"48-0"`.
fn deserialize_moisture_channel<'de, D>(deserializer: D) -> Result<MoistureChannel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
    let invalid = |expected: &str| {
        <D::Error as Error>::invalid_value(serde::de::Unexpected::Str(&raw), &expected)
    };

    let mut parts = raw.splitn(2, '-');
    let (address, pin) = match (parts.next(), parts.next()) {
        (Some(address), Some(pin)) => (address, pin),
        _ => return Err(invalid("an I2C address and an ADC input separated by '-', like \"48-0\"")),
    };

    let i2c_address = u8::from_str_radix(address, 16)
        .ok()
        .filter(|a| *a <= MAX_I2C_ADDRESS)
        .ok_or_else(|| invalid("a 7-bit hexadecimal I2C address before the '-'"))?;
    let analog_pin = pin
        .parse::<u8>()
        .ok()
        .filter(|p| *p < ADS1115_INPUTS)
        .ok_or_else(|| invalid("an ADS1115 input between 0 and 3 after the '-'"))?;

    Ok(MoistureChannel {
        i2c_address,
        analog_pin,
    })
}
