use clap::{Parser, Subcommand};
use std::path::PathBuf;

use doc_qa::commands::{answer_batch_files, serve_http, show_or_init_config};
use doc_qa::config::Config;

#[derive(Parser)]
#[command(name = "doc-qa")]
#[command(about = "Retrieval-augmented question answering over PDF and JSON documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP upload endpoint
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Answer a question batch against a context document
    Answer {
        /// JSON file with an array of {"question": ...} objects
        #[arg(long)]
        questions: PathBuf,
        /// Context document (.pdf or .json)
        #[arg(long)]
        context: PathBuf,
        /// Where to write the answers (prints to stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show or initialize the configuration file
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Serve { port } => {
            serve_http(config, port).await?;
        }
        Commands::Answer {
            questions,
            context,
            output,
        } => {
            answer_batch_files(&config, &questions, &context, output).await?;
        }
        Commands::Config { show } => {
            show_or_init_config(&config, show)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["doc-qa", "config", "--show"]);
        assert!(cli.is_ok());

        let cli = Cli::try_parse_from([
            "doc-qa", "answer", "--questions", "q.json", "--context", "ctx.pdf",
        ]);
        assert!(cli.is_ok());

        let cli = Cli::try_parse_from(["doc-qa", "serve", "--port", "9000"]);
        match cli.expect("serve should parse").command {
            Commands::Serve { port } => assert_eq!(port, Some(9000)),
            _ => panic!("expected serve command"),
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        let cli = Cli::try_parse_from(["doc-qa", "bogus"]);
        assert!(cli.is_err());
    }
}
