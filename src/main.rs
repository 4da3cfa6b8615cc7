use std::sync::Arc;

use anyhow::Context;
use argh::FromArgs;
use framework_laptop::{
    backlight::KeyboardBacklight,
    charge::ChargeLimit,
    cros_ec::{self, CrosEc},
    driver,
    ec::{Ec, EcDevice},
    host::SysfsDmi,
};

/// framework-laptop - charge limit and keyboard backlight control for Framework laptops
#[derive(Debug, FromArgs)]
struct Args {
    /// EC character device [default=/dev/cros_ec]
    #[argh(option, default = "String::from(cros_ec::DEFAULT_PATH)")]
    device: String,

    /// don't check that this is a Framework Laptop
    #[argh(switch)]
    skip_dmi: bool,

    #[argh(subcommand)]
    command: Subcommand,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum Subcommand {
    ChargeLimit(ChargeLimitArgs),
    Backlight(BacklightArgs),
}

/// print or set the upper battery charge limit
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "charge-limit")]
struct ChargeLimitArgs {
    /// new limit in percent (0-100)
    #[argh(positional)]
    value: Option<u32>,
}

/// print or set the keyboard backlight brightness
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "backlight")]
struct BacklightArgs {
    /// new brightness in percent (0-100)
    #[argh(positional, from_str_fn(parse_brightness))]
    value: Option<u8>,
}

fn parse_brightness(s: &str) -> Result<u8, String> {
    let brightness = s.parse::<u8>().map_err(|e| e.to_string())?;
    if brightness > 100 {
        return Err(format!(
            "invalid brightness value {brightness} (valid range: 0-100)"
        ));
    }
    Ok(brightness)
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_module(
            env!("CARGO_CRATE_NAME"),
            if cfg!(debug_assertions) {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
        )
        .parse_default_env()
        .init();

    let args: Args = argh::from_env();
    log::debug!("args={:?}", args);

    if !args.skip_dmi {
        driver::check_platform(&SysfsDmi::new())?;
    }

    let transfer = CrosEc::open(&args.device)
        .with_context(|| format!("failed to open {}", args.device))?;
    let device = Arc::new(EcDevice::new(&args.device, Box::new(transfer)));
    let ec = Ec::new(&device);

    match args.command {
        Subcommand::ChargeLimit(ChargeLimitArgs { value }) => {
            let limit = ChargeLimit::new(ec);
            if let Some(value) = value {
                limit.set_threshold(value)?;
            }
            println!("{}", limit.get_threshold()?);
        }
        Subcommand::Backlight(BacklightArgs { value }) => {
            let kbd = KeyboardBacklight::new(ec);
            if let Some(value) = value {
                kbd.set_brightness(value)?;
            }
            println!("{}", kbd.get_brightness());
        }
    }

    Ok(())
}
