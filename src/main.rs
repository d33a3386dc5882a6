use std::error::Error;

use clap::Parser;

use repograph::{
    cli::args::{CliArgs, Command},
    config::RepographConfig,
    Repograph,
};

fn run() -> Result<(), Box<dyn Error>> {
    let cli_args = CliArgs::parse();
    let config = RepographConfig::load()?;

    let mut builder = Repograph::builder();
    if let Some(root) = cli_args.root {
        builder = builder.root(root);
    }
    if let Some(manifest) = cli_args.manifest_location.or(config.manifest_path) {
        builder = builder.manifest_file_name(manifest);
    }
    if let Some(arch) = config.arch {
        builder = builder.arch(arch);
    }

    let repograph = builder.try_build()?;

    match cli_args.cmd {
        Command::Closure { package, depth } => repograph.closure(&package, depth),
        Command::Requires { package, build } => repograph.requires(&package, build),
        Command::Subpackages { package } => repograph.subpackages(&package),
        Command::Graph { output } => repograph.graph(output.as_deref()),
        Command::Stats => repograph.stats(),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
