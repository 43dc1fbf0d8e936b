use clap::Parser;
use ghost::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(cli.log_level.as_str()))
        .init();

    if let Err(err) = ghost::run(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
