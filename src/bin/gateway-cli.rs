use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ai_gateway::config::{self, GatewayConfig};
use ai_gateway::observability::logging;
use ai_gateway::upstream::inference::{EmbeddingsRequest, GenerateRequest};
use ai_gateway::Gateway;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Smoke-test the configured upstreams", long_about = None)]
struct Cli {
    /// TOML config file; environment variables are used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a generation prompt to the inference upstream
    Generate {
        #[arg(short, long, default_value = "llama3")]
        model: String,

        prompt: String,

        /// Request a streamed (newline-delimited) upstream response
        #[arg(long)]
        stream: bool,
    },
    /// Embed one or more texts
    Embed {
        #[arg(short, long, default_value = "nomic-embed-text")]
        model: String,

        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Upload a file to the media upstream
    Upload {
        file: PathBuf,

        #[arg(short, long)]
        folder: Option<String>,

        #[arg(long, default_value = "image")]
        resource_type: String,
    },
    /// Print the resolved configuration (secrets redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("ai_gateway=info,gateway_cli=info");

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::config_from_env()?,
    };

    match cli.command {
        Commands::Generate {
            model,
            prompt,
            stream,
        } => {
            let gateway = Gateway::new(cfg)?;
            let res = gateway
                .generate(&GenerateRequest {
                    model,
                    prompt,
                    stream,
                    options: None,
                })
                .await?;
            println!("{}", res.response);
        }
        Commands::Embed { model, texts } => {
            let gateway = Gateway::new(cfg)?;
            let res = gateway.embeddings(&EmbeddingsRequest { model, input: texts }).await?;
            for (i, vector) in res.embeddings.iter().enumerate() {
                println!("[{}] {} dims", i, vector.len());
            }
        }
        Commands::Upload {
            file,
            folder,
            resource_type,
        } => {
            let gateway = Gateway::new(cfg)?;
            let bytes = tokio::fs::read(&file).await?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or("upload path has no filename")?;
            let res = gateway
                .upload(bytes, &filename, folder.as_deref(), &resource_type)
                .await?;
            println!("{}  {}", res.public_id, res.secure_url);
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&redacted(cfg))?);
        }
    }

    Ok(())
}

/// Mask credential values so the resolved config is safe to paste around.
fn redacted(mut cfg: GatewayConfig) -> GatewayConfig {
    for secret in [&mut cfg.media.api_key, &mut cfg.media.api_secret] {
        if !secret.is_empty() {
            *secret = "***".to_string();
        }
    }
    cfg
}
