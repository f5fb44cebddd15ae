use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zpc_shell::{SpecShellConfig, run_repl};

/// Logs go to stderr; stdout is the operator channel.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "zpc_shell=info,zpc_io_fs=info,zpc_log=warn".into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let spec_config = SpecShellConfig::parse();
    init_tracing();

    let mut shell = spec_config.build_shell()?;
    let stdin = std::io::stdin();
    run_repl(&mut shell, stdin.lock(), std::io::stdout())?;
    Ok(())
}
