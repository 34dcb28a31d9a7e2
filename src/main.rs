use clap::Parser;
use sabwatch::cli::{Cli, Commands};
use sabwatch::{Config, run};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = if matches!(cli.command, Some(Commands::Init)) {
        Config::default()
    } else {
        Config::load(cli.config.as_deref())?
    };
    let worker_threads = config.general.worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(run(cli, config))
}
