//! Rookwire bridge
//!
//! Connects a chessboard controller on a serial port to a remote chess
//! session. Two tasks run on the host executor:
//!
//! - input: polls the board and forwards entered moves
//! - session: idle menu, games and LED feedback

mod archive;
mod channels;
mod cli;
mod config;
mod error;
mod logging;
mod remote;
mod tasks;

use clap::Parser;
use embassy_executor::Spawner;
use embassy_futures::join::join;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use rookwire_core::link::SerialLink;
use rookwire_core::poller::InputPoller;
use tracing::{error, info};

use crate::archive::DirectoryArchive;
use crate::cli::CliArgs;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::remote::BenchRemote;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let args = CliArgs::parse();

    let mut config = match BridgeConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("rookwire: {}", e);
            std::process::exit(2);
        }
    };
    config.apply_cli_overrides(&args);
    logging::init(&config.logging.level);

    info!(version = env!("CARGO_PKG_VERSION"), "rookwire starting");
    match run(&config).await {
        Ok(()) => info!("board powered down, exiting"),
        Err(e) => {
            error!(error = %e, "bridge stopped");
            std::process::exit(1);
        }
    }
}

async fn run(config: &BridgeConfig) -> Result<(), BridgeError> {
    let session_config = config.session_config();

    let (rx, tx) = rookwire_hal_std::open(&config.serial.port, &config.serial.uart_config())?;
    info!(port = %config.serial.port, baud = config.serial.baud, "serial port open");
    let tx = Mutex::<CriticalSectionRawMutex, _>::new(tx);

    let remote = BenchRemote::new(
        &config.account.id,
        &config.bench.opponent,
        &config.bench.script,
    )?;
    let mut archive = DirectoryArchive::new(config.archive.dir.clone());

    let link = SerialLink::new(rx, &tx, config.limits.max_repeat_requests);
    let (_, session) = join(
        tasks::input_task(InputPoller::new(link)),
        tasks::session_task(&remote, &tx, &mut archive, &session_config),
    )
    .await;
    session
}
