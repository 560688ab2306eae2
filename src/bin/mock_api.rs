//! Mock posts/users API binary
//!
//! Serves the in-memory reference API so the suite can be pointed at a
//! local target: `mock-api --port 3000` then `posts-e2e run`.

use std::net::SocketAddr;

use clap::Parser;
use posts_e2e::common::logging;
use posts_e2e::mock::{self, MockServer, MockStore, SEED_POSTS};

#[derive(Parser)]
#[command(name = "mock-api", about = "In-memory posts/users API for local runs")]
#[command(version, long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: std::net::IpAddr,

    /// Port to listen on
    #[arg(long, short, default_value = "3000")]
    port: u16,

    /// Number of posts to seed
    #[arg(long, default_value_t = SEED_POSTS)]
    seed: i64,
}

#[tokio::main]
async fn main() {
    logging::init_mock_server();

    let args = Args::parse();
    let addr = SocketAddr::new(args.host, args.port);

    match MockServer::start(addr, mock::router_with(MockStore::seeded(args.seed))).await {
        Ok(server) => {
            println!("Mock API listening on {} ({} posts)", server.addr(), args.seed);
            server.wait().await;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
