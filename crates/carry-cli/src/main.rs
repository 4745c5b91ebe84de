//! carry CLI - rebase a downstream fork by replaying its carried commits.

use clap::Parser;

mod commands;
mod logging;
mod output;

use commands::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.quiet);
    output::set_quiet(cli.quiet);

    let result = match &cli.command {
        Commands::Apply(args) => commands::apply::run(args, &cli.config),
        Commands::Classify {
            revs,
            repository,
            json,
        } => commands::classify::run(revs, repository, *json),
        Commands::Completions { shell } => commands::completions::run(*shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
