use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use battleship_hub::{init_logging, sim, GameEngine, Hub, Server, ServerConfig};
use clap::Parser;
use rand::Rng;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    /// Run the game server.
    Serve {
        #[arg(long, env = "BATTLESHIP_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
        /// Outbound frames buffered per connection before it is dropped.
        #[arg(long, env = "BATTLESHIP_OUTBOUND_CAPACITY", default_value_t = battleship_hub::DEFAULT_OUTBOUND_CAPACITY)]
        outbound_capacity: usize,
        #[arg(long, env = "BATTLESHIP_MAX_FRAME", default_value_t = battleship_hub::DEFAULT_MAX_FRAME_SIZE)]
        max_frame: u32,
        #[arg(long, env = "BATTLESHIP_IDLE_TIMEOUT_SECS", default_value_t = battleship_hub::DEFAULT_IDLE_TIMEOUT.as_secs())]
        idle_timeout_secs: u64,
        /// Seconds a single frame write may take before the connection is dropped.
        #[arg(long, env = "BATTLESHIP_WRITE_TIMEOUT_SECS", default_value_t = battleship_hub::DEFAULT_WRITE_TIMEOUT.as_secs())]
        write_timeout_secs: u64,
    },
    /// Play a scripted match on the local machine.
    Local {
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            outbound_capacity,
            max_frame,
            idle_timeout_secs,
            write_timeout_secs,
        } => {
            let config = ServerConfig {
                bind_address: bind,
                outbound_capacity,
                max_frame_size: max_frame,
                write_timeout: Duration::from_secs(write_timeout_secs),
                idle_timeout: Duration::from_secs(idle_timeout_secs),
            };
            let engine = Arc::new(GameEngine::in_memory());
            let server = Server::new(engine, Hub::spawn(), config);
            server.run().await?;
        }
        Commands::Local { seed } => {
            println!("Starting local scripted game...");
            let seed = match seed {
                Some(s) => {
                    println!("Using fixed seed: {} (game will be reproducible)", s);
                    s
                }
                None => rand::rng().random(),
            };
            let report = sim::play(seed, seed.wrapping_add(1)).await?;
            for side in [&report.player1, &report.player2] {
                println!(
                    "player {}: {} shots, {} hits",
                    side.player_id, side.shots, side.hits
                );
            }
            println!("Winner: player {}", report.winner);
        }
    }
    Ok(())
}
