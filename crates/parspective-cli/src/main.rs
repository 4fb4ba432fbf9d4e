use std::process::ExitCode;

use clap::Parser;

use parspective_cli::{run, Cli, ExternalBackend, ParBackend};

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let mut backend = cli.par_command.as_deref().map(ExternalBackend::new);
    let backend = backend.as_mut().map(|b| b as &mut dyn ParBackend);

    match run(&cli, backend) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
