use std::io::Write;

use amdsmi::AmdSmiLib;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use utils::logging;
use utils::version;

use crate::config::Cli;

mod config;
mod encoders;
mod inventory;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();
    logging::init_with_level(logging::level_for_verbosity(cli.verbose));

    tracing::info!("Starting amdsmi-probe {}", &**version::VERSION);

    run(&cli)
}

#[cfg(not(feature = "static-link"))]
fn binding(cli: &Cli) -> AmdSmiLib {
    AmdSmiLib::new(amdsmi::DynamicOpener::with_override(cli.lib_path.clone()))
}

#[cfg(feature = "static-link")]
fn binding(cli: &Cli) -> AmdSmiLib {
    if let Some(path) = &cli.lib_path {
        tracing::warn!(path = %path.display(), "library path ignored for a linked build");
    }
    AmdSmiLib::linked()
}

fn run(cli: &Cli) -> Result<()> {
    let mut lib = binding(cli);
    lib.load().context("failed to load AMD SMI library")?;

    lib.init(cli.processors.into())?;
    tracing::info!("AMD SMI initialized");

    let inventory = inventory::collect(&lib, cli.socket_name_len)?;
    tracing::info!(
        sockets = inventory.sockets.len(),
        processors = inventory.processor_count(),
        "inventory collected"
    );

    lib.shut_down()?;
    tracing::info!("AMD SMI shut down");
    lib.unload();

    let output = encoders::render(cli.format, &inventory, encoders::current_time());
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write report")?;

    Ok(())
}
