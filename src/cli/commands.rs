use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ace-chain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    #[command(name = "startnode", about = "Start a ledger node")]
    StartNode {
        #[arg(long, help = "TOML file with node settings")]
        config: Option<PathBuf>,
        #[arg(long = "http-addr", help = "Address to serve HTTP and peer links on")]
        http_addr: Option<String>,
        #[arg(
            long = "peer",
            help = "Peer endpoint to dial at startup, e.g. ws://host:8081/addPeer (repeatable)"
        )]
        peer: Vec<String>,
    },
    #[command(name = "genesis", about = "Print the genesis block as JSON")]
    Genesis,
    #[command(
        name = "validatechain",
        about = "Check a JSON chain file against the validation rules"
    )]
    ValidateChain {
        #[arg(help = "Path to a JSON array of blocks")]
        path: PathBuf,
    },
}
