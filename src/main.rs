use clap::Parser;
use todos::cli::{self, Cli};
use todos::{Config, Error};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    if let Err(e) = run(args).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> Result<(), Error> {
    let cfg = Config::load(args.command.service(), &args.env)?;
    init_tracing(cfg.debug);
    cli::run(args, cfg).await
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "todos=debug,tower_http=debug,sqlx=debug"
    } else {
        "todos=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}
