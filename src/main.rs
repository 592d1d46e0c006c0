use std::{error::Error, path::PathBuf};

use analog_clock::{
    config::Config,
    scale::{self, BASE_MIN_SIZE, BASE_SIZE},
    sources::{self, EmbeddedBundle},
    Clock,
};
use clap::{Parser, Subcommand};
use eframe::{
    egui::{ViewportBuilder, WindowLevel},
    run_native,
};
use log::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Option<Command>,
    /// display scale, snapped to the nearest of 0.5, 0.75, 1, 1.25 and 1.5
    #[clap(long)]
    scale: Option<f32>,
    /// keep the clock above other windows
    #[clap(long)]
    topmost: bool,
    /// alarm time to start with, like 07:00
    #[clap(long)]
    alarm: Option<String>,
    /// directory to look for assets in after the built in ones
    #[clap(long)]
    origin: Option<PathBuf>,
    /// config file to read instead of the default one
    #[clap(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// write the built in assets to the origin directory so they can be edited
    InstallAssets {
        #[clap(long, short)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("analog_clock").expect("couldn't initialize logger");

    let args = Args::parse();
    let config = load_config(&args);

    if let Some(Command::InstallAssets { force }) = args.command {
        let origin = config
            .origin()
            .ok_or("there is no directory to install the assets to, pass --origin")?;
        let written = sources::install_assets(&EmbeddedBundle::builtin(), &origin, force)?;
        println!("installed {written} assets to {}", origin.display());
        return Ok(());
    }

    // frameless and transparent so only the face shows
    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("Analog Clock")
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(true)
            .with_inner_size(BASE_SIZE)
            .with_min_inner_size(BASE_MIN_SIZE)
            .with_window_level(if config.topmost {
                WindowLevel::AlwaysOnTop
            } else {
                WindowLevel::Normal
            }),
        ..Default::default()
    };

    info!("starting with {config:?}");
    run_native(
        "Analog Clock",
        native_options,
        Box::new(|cc| Ok(Box::new(Clock::new(cc, config)))),
    )
    .map_err(std::convert::Into::into)
}

/// The config file with the command line on top. A broken config file is
/// not fatal, the defaults are used instead.
fn load_config(args: &Args) -> Config {
    let mut config = match args.config.clone().or_else(Config::config_path) {
        Some(path) => Config::load(&path).unwrap_or_else(|e| {
            warn!("{e}, using the default config");
            Config::default()
        }),
        None => {
            warn!("no config directory, using the default config");
            Config::default()
        }
    };
    if let Some(scale) = args.scale {
        config.scale = scale::nearest_preset(scale);
    }
    if args.topmost {
        config.topmost = true;
    }
    if let Some(alarm) = &args.alarm {
        config.alarm = Some(alarm.clone());
    }
    if let Some(origin) = &args.origin {
        config.origin = Some(origin.clone());
    }
    config
}
