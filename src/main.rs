// SPDX-License-Identifier: GPL-3.0-only

use camview::Config;
use camview::backends::camera::IoMethod;
use camview::config::{ConfigOverrides, OutputSize, RendererKind};
use camview::media::LumaRange;
use camview::terminal::TerminalAwareStderr;
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

mod cli;

#[derive(Parser)]
#[command(name = "camview")]
#[command(about = "Live camera viewer for V4L2 devices")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    view: ViewArgs,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available capture devices
    List,

    /// Print the effective configuration as JSON
    Config {
        /// Also store it as the new default configuration
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Video device node
    #[arg(short, long)]
    device: Option<String>,

    /// Buffer I/O method
    #[arg(long, value_enum)]
    io: Option<IoMethod>,

    /// Force format (640x480 YUYV unless --size / --pixel-format say otherwise)
    #[arg(short = 'f', long)]
    force_format: bool,

    /// Capture size to force, as WIDTHxHEIGHT
    #[arg(long)]
    size: Option<OutputSize>,

    /// Pixel format FourCC to force (YUYV, UYVY, NV12, YU12, ...)
    #[arg(long)]
    pixel_format: Option<String>,

    /// Displayed size, as WIDTHxHEIGHT (center crop of the capture)
    #[arg(short, long)]
    output: Option<OutputSize>,

    /// Luma range of the source (default: from driver, then by layout)
    #[arg(long, value_enum)]
    luma_range: Option<LumaRange>,

    /// Number of frames to grab (default: run until quit)
    #[arg(short = 'c', long = "count")]
    frame_count: Option<u64>,

    /// Display refresh rate in Hz
    #[arg(long)]
    refresh_hz: Option<u32>,

    /// Where to show frames
    #[arg(long, value_enum)]
    renderer: Option<RendererKind>,
}

impl ViewArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            device: self.device.clone(),
            io_method: self.io,
            force_format: self.force_format,
            format_size: self.size,
            pixel_format: self.pixel_format.clone(),
            output_size: self.output,
            luma_range: self.luma_range,
            frame_count: self.frame_count,
            refresh_hz: self.refresh_hz,
            renderer: self.renderer,
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camview=debug, RUST_LOG=info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| format!("cannot open log file {}: {}", path.display(), e))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => builder.with_writer(TerminalAwareStderr).init(),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_file.as_deref()) {
        eprintln!("camview: {}", e);
        return ExitCode::FAILURE;
    }

    let mut config = Config::load();
    config.apply(&cli.view.overrides());

    let result = match cli.command {
        Some(Commands::List) => cli::list_devices(),
        Some(Commands::Config { save }) => cli::print_config(&config, save),
        None => cli::view(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("camview: {}", e);
            ExitCode::FAILURE
        }
    }
}
