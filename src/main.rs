extern crate ads1x15;
extern crate chrono;
extern crate config;
#[macro_use]
extern crate failure;
extern crate futures;
extern crate i2cdev;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[cfg_attr(test, macro_use)]
extern crate serde_json;
#[macro_use]
extern crate slog;
extern crate slog_async;
extern crate slog_envlogger;
extern crate slog_scope;
extern crate slog_stdlog;
extern crate slog_term;
#[macro_use]
extern crate structopt;
extern crate sysfs_gpio;
extern crate uuid;

use std::path;
use std::time;

use slog::Drain;
use structopt::StructOpt;

pub mod calibration;
pub mod controller;
pub mod pumps;
pub mod schema;
pub mod sensors;
pub mod settings;
pub mod util;

type HardwareController = controller::MoistureController<
    pumps::Pump,
    sensors::Ads1115<i2cdev::linux::LinuxI2CDevice>,
    util::MonotonicClock,
>;

#[derive(Debug, StructOpt)]
#[structopt(name = "trickle", about = "Waters a plant when its soil gets too dry.")]
struct Options {
    /// Settings file to load.
    #[structopt(
        short = "c",
        long = "config",
        default_value = "trickle.toml",
        parse(from_os_str)
    )]
    config: path::PathBuf,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Check the soil periodically and water when needed.
    #[structopt(name = "run")]
    Run,
    /// Sample the sensor once and print the plant status as JSON.
    #[structopt(name = "read")]
    Read,
    /// Run one watering cycle right now.
    #[structopt(name = "water")]
    Water,
}

fn main() -> Result<(), failure::Error> {
    let options = Options::from_args();

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::new(drain).ignore_res();
    let drain = slog_async::Async::new(drain).build().fuse();
    let log = slog::Logger::root(drain, o!());

    let _scope_guard = slog_scope::set_global_logger(log.clone());
    slog_stdlog::init()
        .map_err(|e| failure::err_msg(format!("could not install log bridge: {}", e)))?;

    let settings = settings::Settings::load(&options.config)?;
    let log = log.new(o!(
        "plant" => settings.plant.id.to_string(),
        "name" => settings.plant.name.clone()
    ));

    let mut controller = open_controller(&log, &settings)?;

    match options.command {
        Command::Run => {
            info!(log, "started"; "threshold" => controller.moisture_threshold());
            util::every(
                &log,
                "update",
                time::Duration::from_millis(settings.watering.poll_interval_ms),
                || controller.update().map(|_| ()),
            )
        }
        Command::Read => {
            let sample = controller.sample()?;
            let status = schema::Status::new(&settings.plant, chrono::Utc::now(), &sample);
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Water => {
            controller.water()?;
            info!(log, "manual watering done");
        }
    }

    Ok(())
}

fn open_controller(
    log: &slog::Logger,
    settings: &settings::Settings,
) -> Result<HardwareController, failure::Error> {
    let pump = pumps::Pump::new(
        log.new(o!("component" => "pump")),
        settings.pump.pin,
        settings.pump.active_low,
    )?;

    let channel = &settings.sensor.channel;
    let i2c_dev = i2cdev::linux::LinuxI2CDevice::new(
        &settings.sensor.i2c_bus,
        u16::from(channel.i2c_address),
    )?;
    let sensor = sensors::Ads1115::new(
        log.new(o!("component" => "sensor")),
        i2c_dev,
        channel.analog_pin,
    )?;

    let controller = controller::MoistureController::new(
        log.new(o!("component" => "controller")),
        pump,
        sensor,
        util::MonotonicClock::new(),
        settings.calibration,
        settings.watering.duration_ms,
    )?;

    Ok(controller.with_min_time_between_waterings(settings.watering.min_time_between_ms))
}
