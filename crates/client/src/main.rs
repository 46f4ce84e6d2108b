mod game;
mod net;
mod tui;

use anyhow::Result;
use clap::Parser;
use tokio::runtime::Runtime;

use net::ClientConfig;

#[derive(Parser)]
#[command(name = "duel-client")]
#[command(about = "Two-player block duel client")]
struct Args {
    #[arg(
        short,
        long,
        default_value = "127.0.0.1:27015",
        help = "Relay server address"
    )]
    server: String,

    #[arg(short, long, help = "Room code to join; a random one is generated if omitted")]
    room: Option<String>,

    #[arg(long, help = "Play with a random bot and log to stderr instead of drawing")]
    autoplay: bool,

    #[arg(long, help = "Seed for the local board")]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.autoplay {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let room = args
        .room
        .unwrap_or_else(|| duel::generate_room_code(&mut rand::thread_rng()));
    log::info!("Room code: {}", room);

    let config = ClientConfig {
        server_addr: args.server,
        room,
        seed: args.seed,
        ..Default::default()
    };

    let runtime = Runtime::new()?;
    runtime.block_on(game::run(config, args.autoplay))
}
