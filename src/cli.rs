use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hardcourt")]
#[command(version = "0.1.0")]
#[command(about = "Live tennis match tracker with real-time fan-out", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory (default.toml plus $HARDCOURT_ENV.toml)
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Override the HTTP/WebSocket port
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// PostgreSQL URL; without one state is kept in memory
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Run the simulator when no real live matches are found
    #[arg(long, env = "ENABLE_SIMULATOR")]
    pub enable_simulator: Option<bool>,

    /// Emit JSON logs
    #[arg(long)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP/WebSocket service (default)
    Serve,
    /// Fetch live matches once and print them
    Fetch {
        /// Print full match JSON instead of a summary line per match
        #[arg(long)]
        json: bool,
    },
}
