use clap::Parser;
use client::{input, network};
use log::info;
use std::io::BufReader;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:1234")]
    server: String,

    /// Display name; asked for interactively when omitted
    #[arg(short = 'n', long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let mut lines = input::spawn_line_reader(BufReader::new(std::io::stdin()), 16);

    let name = match args.name {
        Some(name) => name,
        None => {
            println!("What is your name?");
            lines.recv().await.ok_or("No name given")?
        }
    };

    info!("Starting client...");
    info!("Connecting to: {}", args.server);

    let mut client = network::Client::new(&args.server, input::clean_name(&name)).await?;
    client.run(lines).await?;

    Ok(())
}
