use std::io::{self, Write};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hopssh::{inventory_path, load_inventory, settings_path, App, Cli, GlobalSettings};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("hopssh: {err:#}");
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let settings = GlobalSettings::load(settings_path(cli.settings));
    let inventory = load_inventory(inventory_path(cli.inventory))?;

    if cli.list_hosts {
        // completion contract: one raw hostname per line, file order
        let mut out = io::stdout().lock();
        for entry in &inventory {
            writeln!(out, "{}", entry.hostname)?;
        }
        return Ok(0);
    }

    let app = App::new(settings, inventory);
    match cli.query.as_deref() {
        Some(query) => app.run_direct(query),
        None => app.run_interactive(),
    }
}
