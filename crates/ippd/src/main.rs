// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ippd — a self-contained IPP printer server that advertises itself over
// mDNS. Parses the command line, builds a [`ServerConfig`] and [`Printer`],
// and runs the listener until interrupted.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use ippd_server::config::ServerConfig;
use ippd_server::listener;

/// A self-contained IPP printer server that advertises itself over mDNS.
#[derive(Parser, Debug)]
#[command(name = "ippd", version)]
struct Cli {
    /// Printer name, advertised via DNS-SD and reported as printer-name.
    name: String,

    /// Enable two-sided (duplex) printing support.
    #[arg(short = '2')]
    duplex: bool,

    /// Manufacturer name, used in printer-make-and-model and printer-device-id.
    #[arg(short = 'M', default_value = "Unknown")]
    manufacturer: String,

    /// Spool directory for received documents.
    #[arg(short = 'd')]
    directory: Option<PathBuf>,

    /// Comma-separated document-format-supported list.
    #[arg(short = 'f', default_value = ServerConfig::DEFAULT_FORMATS)]
    formats: String,

    /// Icon file advertised at /icon.png.
    #[arg(short = 'i', default_value = ServerConfig::DEFAULT_ICON)]
    icon: PathBuf,

    /// Printer location text.
    #[arg(short = 'l')]
    location: Option<String>,

    /// Model name, used in printer-make-and-model and printer-device-id.
    #[arg(short = 'm', default_value = "Unknown")]
    model: String,

    /// TCP port to bind; 0 asks the OS to pick one.
    #[arg(short = 'p', default_value_t = 0)]
    port: u16,

    /// DNS-SD service type to register under.
    #[arg(short = 'r', default_value = ServerConfig::DEFAULT_REGTYPE)]
    regtype: String,

    /// Print speed as "mono-ppm,color-ppm"; color-ppm of 0 means monochrome only.
    #[arg(short = 's', default_value = "10,0")]
    speed: String,

    /// Increase logging verbosity; repeatable.
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_speed(speed: &str) -> Option<(u32, u32)> {
    let (mono, color) = speed.split_once(',')?;
    Some((mono.trim().parse().ok()?, color.trim().parse().ok()?))
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        let (ppm, ppm_color) = parse_speed(&self.speed).unwrap_or((10, 0));
        let mut config = ServerConfig::new(self.name);
        config.location = self.location;
        config.make = self.manufacturer;
        config.model = self.model;
        config.icon_path = Some(self.icon);
        config.formats = self.formats.split(',').map(str::to_string).collect();
        config.duplex = self.duplex;
        config.ppm = ppm;
        config.ppm_color = ppm_color;
        config.port = self.port;
        config.regtype = self.regtype;
        config.verbose = self.verbose;
        if let Some(dir) = self.directory {
            config.spool_dir = dir;
        }
        config
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap already printed usage/help to the right stream.
            let _ = e.print();
            std::process::exit(1);
        }
    };

    init_logging(cli.verbose);
    let config = cli.into_config();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start async runtime");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config)) {
        error!(error = %e, "ippd exited with an error");
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> std::io::Result<()> {
    let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "ippd".to_string());
    let (_printer, shutdown, port, advertisement) = listener::start(config, hostname)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    info!(port, "ippd running");

    tokio::signal::ctrl_c().await?;
    info!("received interrupt, shutting down");
    shutdown.notify_one();
    if let Some(advertisement) = advertisement {
        advertisement.unregister();
    }
    Ok(())
}
