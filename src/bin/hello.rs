use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use hellobpf::{
    libbpf::{self, LibbpfLoader},
    logging, ProbeConfig, ProbeError, Shutdown,
};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, Parser)]
struct Command {
    /// Print libbpf debug output
    #[clap(short, long)]
    verbose: bool,
}

async fn run(opts: Command) -> anyhow::Result<()> {
    let config = ProbeConfig::default();
    let loader = LibbpfLoader;

    let attached = hellobpf::attach(&loader, &config)?;

    // 退出信号监听
    let shutdown = Shutdown::new();
    shutdown
        .listen()
        .context("error while setting ctrlc handler")?;

    let summary = attached.run_until(&shutdown).await;
    info!("{} programs loaded", summary.programs);
    println!("Monitoring stopped");

    Ok(())
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<ProbeError>() {
        Some(probe) => {
            for line in probe.diagnostics() {
                error!("{}", line);
            }
        }
        None => error!("{:#}", err),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let opts = Command::parse();
    libbpf::init_libbpf_log(opts.verbose);

    match run(opts).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}
