use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "hopssh", version, about = "Pick a host, build the ssh command, connect")]
pub struct Cli {
    /// Hostname, unique prefix, or raw address to connect to. May start with
    /// inline slash flags, e.g. "/l/v web1".
    pub query: Option<String>,

    /// Print every known hostname, one per line, and exit.
    #[arg(long)]
    pub list_hosts: bool,

    /// Inventory file (default: ./hosts.csv, then the user config dir).
    #[arg(long, value_name = "FILE")]
    pub inventory: Option<PathBuf>,

    /// Settings file (default: ./config.ini, then the user config dir).
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}
