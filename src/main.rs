use clap::Parser;
use reportrecon::adapters::file_config_adapter::FileConfigAdapter;
use reportrecon::cli::{Cli, run};
use reportrecon::domain::settings::log_level;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over [log] level; an unreadable config is reported by `run`.
    let level = FileConfigAdapter::from_file(cli.command.config_path())
        .map(|config| log_level(&config))
        .unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    run(cli)
}
