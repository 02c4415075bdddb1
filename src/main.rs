//! HamClock Update Web
//!
//! Usage:
//! - Normal mode: `hamclock-update-web`
//! - Custom config file: `hamclock-update-web --config /etc/default/hamclock`
//! - Custom port: `hamclock-update-web --port 9090`
//! - Development without root: `hamclock-update-web --allow-non-root`

use clap::Parser;
use std::path::PathBuf;

use hamclock_update_web::config::dashboard::constants::DEFAULT_CONFIG_PATH;
use hamclock_update_web::logging::{self, LogFormat};
use hamclock_update_web::DashboardConfig;

#[derive(Debug, Parser)]
#[command(name = "hamclock-update-web", version, about = "Web dashboard for HamClock updates")]
struct Cli {
    /// Config file with KEY=value lines
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the listening port
    #[arg(long)]
    port: Option<u16>,

    /// Override the listening address
    #[arg(long)]
    bind: Option<String>,

    /// Log output format
    #[arg(long, value_enum, env = "HAMCLOCK_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Skip the root check
    #[arg(long)]
    allow_non_root: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    // systemctl and the update script need root
    if !cli.allow_non_root && !nix::unistd::Uid::effective().is_root() {
        tracing::error!("This script must be run as root");
        std::process::exit(1);
    }

    let mut config = DashboardConfig::load(&cli.config)?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(hamclock_update_web::run(config))
}
