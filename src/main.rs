// Entry point for the ledger node CLI
use ace_chain::{
    connect_peer, ensure_valid_chain, serve, ApiState, Block, Chain, Command, Hub, NodeConfig,
    Opt, PeerSettings, SystemClock, GENESIS_BLOCK,
};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use std::fs;
use std::path::Path;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

// RUST_LOG wins over the configured level when set
fn init_logging(level: &str) {
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

async fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::StartNode {
            config,
            http_addr,
            peer,
        } => {
            let mut config = NodeConfig::load(config.as_deref())?;
            if let Some(addr) = http_addr {
                config.http_addr = addr;
            }
            config.peers.extend(peer);
            init_logging(&config.log_level);
            start_node(config).await?;
        }
        Command::Genesis => {
            println!("{}", serde_json::to_string_pretty(&*GENESIS_BLOCK)?);
        }
        Command::ValidateChain { path } => {
            init_logging("info");
            validate_chain_file(&path)?;
        }
    }
    Ok(())
}

async fn start_node(config: NodeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let settings = PeerSettings::from(&config);
    let (hub, hub_task) = Hub::spawn(Chain::new(), Arc::new(SystemClock));

    // an unreachable peer is not fatal; it can be added later via /connectPeer
    for url in &config.peers {
        match connect_peer(url, hub.clone(), settings.clone()).await {
            Ok(addr) => info!("Dialed peer {url} ({addr})"),
            Err(e) => warn!("Could not dial peer {url}: {e}"),
        }
    }

    let state = ApiState {
        hub,
        peer_settings: settings,
    };

    tokio::select! {
        served = serve(state, &config.http_addr) => served?,
        joined = hub_task => match joined {
            Ok(Ok(())) => info!("Hub stopped"),
            Ok(Err(e)) => return Err(e.into()),
            Err(e) => return Err(format!("Hub task failed: {e}").into()),
        },
    }
    Ok(())
}

fn validate_chain_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let blocks = read_chain(path)?;
    ensure_valid_chain(&blocks)?;
    println!("Chain of {} blocks is valid", blocks.len());
    Ok(())
}

fn read_chain(path: &Path) -> Result<Vec<Block>, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&contents)?)
}
