//! DataEater CLI - spreadsheet and CSV cleaning from the command line.

mod cli;
mod commands;
mod logging;
mod server;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match commands::load_config(cli.config.as_deref(), cli.memory_limit) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Sniff { file, json } => commands::sniff::run(file, json, &config),

        Commands::Inspect { file, column, json } => {
            commands::inspect::run(file, column, json, config)
        }

        Commands::Query { file, sql, limit } => commands::query::run(file, sql, limit, config),

        Commands::Apply {
            file,
            script,
            history,
            save_history,
            transactional,
            export,
        } => {
            let history = history.or_else(|| {
                save_history.then(|| dataeater::history::history_path(&file))
            });
            commands::apply::run(file, script, history, transactional, export, config)
        }

        Commands::Serve {
            file,
            port,
            favorites,
        } => commands::serve::run(file, port, favorites, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
