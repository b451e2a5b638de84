use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use quiz_duel::config::{DEFAULT_CHALLENGE_TIMEOUT, DEFAULT_SWEEP_INTERVAL};
use quiz_duel::protocol::DEFAULT_PORT;
use quiz_duel::ServerConfig;
use tracing::error;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// JSON file to load the questions from, e.g. the bundled questions.json
    /// (built-in questions otherwise)
    #[arg(short, long)]
    questions: Option<PathBuf>,

    /// Seconds a challenge waits for an answer
    #[arg(
        long,
        default_value_t = DEFAULT_CHALLENGE_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    challenge_timeout: u64,

    /// Milliseconds between sweeps for expired challenges
    #[arg(long, default_value_t = DEFAULT_SWEEP_INTERVAL.as_millis() as u64)]
    sweep_interval_ms: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            bind: args.bind,
            port: args.port,
            questions_path: args.questions,
            challenge_timeout: Duration::from_secs(args.challenge_timeout),
            sweep_interval: Duration::from_millis(args.sweep_interval_ms),
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = quiz_duel::logging::init(&args.log_level, args.log_json) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = quiz_duel::run(args.into()).await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}
