//! Mesh Command Line Interface
//!
//! Usage:
//!   mesh keygen                - Generate a peer key pair
//!   mesh serve                 - Run a store node
//!   mesh status                - Probe a store node
//!   mesh upload                - Upload a record file as one job
//!   mesh objects <identity>    - List committed chunks
//!   mesh records <file>        - Summarize a record file
//!   mesh checkpoints           - Show local upload checkpoints

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "mesh")]
#[command(about = "Recordmesh peer network CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a peer key pair
    Keygen {
        /// Peer identity the key pair is bound to
        #[arg(short, long)]
        id: String,
    },

    /// Run a store node
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
        /// Object storage directory
        #[arg(short, long, default_value = "mesh-data")]
        data_dir: PathBuf,
        /// Registered peers as id=public_key_hex, repeatable
        #[arg(short, long = "register")]
        register: Vec<String>,
    },

    /// Probe a store node's health endpoint
    Status {
        /// Store node URL
        #[arg(short, long, default_value = "http://localhost:3000")]
        api_url: String,
    },

    /// Upload a record file (JSON lines) as one job
    Upload {
        /// Store node URL
        #[arg(short, long, default_value = "http://localhost:3000")]
        api_url: String,
        /// Peer identity
        #[arg(short, long)]
        id: String,
        /// Hex-encoded secret key
        #[arg(short, long)]
        secret_key: String,
        /// Job identifier
        #[arg(short, long)]
        job_id: String,
        /// Record file, one JSON record per line
        #[arg(short, long)]
        file: PathBuf,
        /// Records per chunk
        #[arg(short, long, default_value = "500")]
        chunk_size: usize,
        /// Checkpoint directory
        #[arg(long, default_value = ".mesh/checkpoints")]
        checkpoint_dir: PathBuf,
    },

    /// List committed chunks under an identity prefix
    Objects {
        /// Store node URL
        #[arg(short, long, default_value = "http://localhost:3000")]
        api_url: String,
        /// Producer identity to list
        identity: String,
    },

    /// Summarize a record file
    Records {
        /// Record file, one JSON record per line
        file: PathBuf,
        /// Show the N most recently captured records
        #[arg(short, long, default_value = "0")]
        recent: usize,
    },

    /// Show local upload checkpoints
    Checkpoints {
        /// Checkpoint directory
        #[arg(long, default_value = ".mesh/checkpoints")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run_command(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match cli.command {
        Commands::Keygen { id } => commands::handle_keygen(&id),

        Commands::Serve {
            host,
            port,
            data_dir,
            register,
        } => commands::handle_serve(&host, port, data_dir, &register).await,

        Commands::Status { api_url } => commands::handle_status(&api_url).await,

        Commands::Upload {
            api_url,
            id,
            secret_key,
            job_id,
            file,
            chunk_size,
            checkpoint_dir,
        } => {
            commands::handle_upload(
                &api_url,
                &id,
                &secret_key,
                &job_id,
                &file,
                chunk_size,
                checkpoint_dir,
            )
            .await
        }

        Commands::Objects { api_url, identity } => {
            commands::handle_objects(&api_url, &identity).await
        }

        Commands::Records { file, recent } => commands::handle_records(&file, recent),

        Commands::Checkpoints { dir } => commands::handle_checkpoints(dir).await,
    }
}
