use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use std::net::{IpAddr, SocketAddr};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// UDP port to listen on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = ServerConfig::with_bind_addr(SocketAddr::new(args.host, args.port));

    let mut server = match Server::new(config.clone()).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start server on {}: {}", config.bind_addr, e);
            eprintln!("Failed to start server on {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };

    let handle = server.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
            handle.shutdown().await;
        }
    });

    if let Err(e) = server.run().await {
        error!("Server stopped with error: {}", e);
        std::process::exit(1);
    }
}
