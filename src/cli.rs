//! CLI module
//!
//! This module provides the command-line interface for the fragments client.

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use serde_json::Value;
use tracing::Level;

use crate::{
    api::client::{
        Anonymous, AuthProvider, BearerToken, ClientConfig, ClientError, FragmentsClient,
        API_URL_ENV, DEFAULT_BASE_URL,
    },
    models::{CreatedFragment, FragmentBody, FragmentList},
};

/// Environment variable holding the bearer token
pub const TOKEN_ENV: &str = "FRAGMENTS_TOKEN";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Fragments service URL
    #[arg(long, global = true, env = API_URL_ENV, default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Bearer token sent as the Authorization header
    #[arg(long, global = true, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List your fragments
    List {
        /// Include full metadata instead of ids only
        #[arg(short, long)]
        expand: bool,
    },

    /// Fetch a fragment by id
    Get {
        /// Fragment id
        id: String,
    },

    /// Create a fragment from text or a file
    Create {
        #[command(flatten)]
        content: Content,

        /// MIME type of the fragment
        #[arg(short = 't', long = "type", default_value = "text/plain")]
        mime_type: String,
    },

    /// Replace the content of a fragment
    Update {
        /// Fragment id
        id: String,

        #[command(flatten)]
        content: Content,
    },

    /// Delete a fragment
    Delete {
        /// Fragment id
        id: String,
    },

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Content {
    /// Fragment text
    #[arg(long)]
    text: Option<String>,

    /// Read the fragment from a file
    #[arg(long)]
    file: Option<PathBuf>,
}

/// Fragment content resolved from the command line
#[derive(Debug, PartialEq)]
enum Payload {
    Text(String),
    File(Vec<u8>),
}

impl Content {
    async fn load(&self) -> Result<Payload, Box<dyn Error>> {
        match (&self.text, &self.file) {
            (Some(text), _) => Ok(Payload::Text(text.trim().to_string())),
            (None, Some(path)) => tokio::fs::read(path)
                .await
                .map(Payload::File)
                .map_err(|e| format!("Cannot read {}: {}", path.display(), e).into()),
            (None, None) => Err("Please type a fragment or select a file".into()),
        }
    }
}

/// Run the CLI application
pub async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, bin_name, &mut io::stdout());
        return Ok(());
    }

    let client = create_client(&cli.api_url)?;
    let auth = create_auth(cli.token.as_deref())?;
    execute(&client, auth.as_ref(), &cli.command).await
}

async fn execute(
    client: &FragmentsClient,
    auth: &dyn AuthProvider,
    command: &Commands,
) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::List { expand } => {
            let data = client.list_fragments_expanded(auth, *expand).await?;
            print_json(&data)?;
            if let Ok(list) = FragmentList::from_body(&data) {
                eprintln!("{}", format!("{} fragment(s)", list.len()).dimmed());
            }
            Ok(())
        }

        Commands::Get { id } => {
            let body = client.get_fragment(auth, required_id(id)?).await?;
            print_body(&body)
        }

        Commands::Create { content, mime_type } => {
            let created = match content.load().await? {
                Payload::Text(text) if text.is_empty() => {
                    return Err("Please type a fragment or select a file".into())
                }
                Payload::Text(text) => client.create_typed_fragment(auth, &text, mime_type).await?,
                Payload::File(bytes) => client.create_file_fragment(auth, bytes, mime_type).await?,
            };
            print_created(&created)
        }

        Commands::Update { id, content } => {
            let id = required_id(id)?;
            let text = match content.load().await? {
                Payload::Text(text) => text,
                Payload::File(bytes) => String::from_utf8(bytes)
                    .map_err(|_| "Update content must be UTF-8 text")?,
            };
            let body = client.update_fragment(auth, id, &text).await?;
            println!("{}", "Fragment updated".green());
            print_body(&body)
        }

        Commands::Delete { id } => {
            let id = required_id(id)?;
            client.delete_fragment(auth, id).await?;
            println!("{} {}", "Fragment deleted:".green(), id);
            Ok(())
        }

        Commands::Completions { .. } => Ok(()),
    }
}

fn create_client(api_url: &str) -> Result<FragmentsClient, ClientError> {
    FragmentsClient::with_config(ClientConfig::new(api_url))
}

fn create_auth(token: Option<&str>) -> Result<Box<dyn AuthProvider>, Box<dyn Error>> {
    match token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => Ok(Box::new(
            BearerToken::new(token).map_err(|_| "Token contains invalid characters")?,
        )),
        None => {
            tracing::warn!("No token configured, sending anonymous requests");
            Ok(Box::new(Anonymous))
        }
    }
}

fn required_id(id: &str) -> Result<&str, Box<dyn Error>> {
    let id = id.trim();
    if id.is_empty() {
        return Err("Please enter a fragment ID".into());
    }
    Ok(id)
}

fn verbosity_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn init_tracing(verbose: u8) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(verbosity_level(verbose))
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn print_json(value: &Value) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_body(body: &FragmentBody) -> Result<(), Box<dyn Error>> {
    match body {
        FragmentBody::Json(value) => print_json(value),
        FragmentBody::Text(text) => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
            Ok(())
        }
        FragmentBody::Binary(bytes) => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn print_created(created: &CreatedFragment) -> Result<(), Box<dyn Error>> {
    println!("{}", "Fragment created".green());
    if let Some(fragment) = created.fragment() {
        println!("  Id: {}", fragment.id);
        println!("  Type: {}", fragment.mime_type);
        println!("  Size: {} bytes", fragment.size);
    }
    match &created.location {
        Some(location) => println!("  Location: {}", location),
        None => println!("  Location: {}", "(not provided)".dimmed()),
    }
    print_json(&created.data)
}

/// Print an error and its causes to stderr
pub fn report_error(err: &dyn Error) {
    eprintln!("{} {}", "error:".red().bold(), err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("fragments").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create_defaults_to_text_plain() {
        let cli = parse(&["create", "--text", "hello"]).unwrap();
        match cli.command {
            Commands::Create { content, mime_type } => {
                assert_eq!(mime_type, "text/plain");
                assert_eq!(content.text.as_deref(), Some("hello"));
                assert!(content.file.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_create_requires_exactly_one_source() {
        assert!(parse(&["create"]).is_err());
        assert!(parse(&["create", "--text", "a", "--file", "b.txt"]).is_err());
        assert!(parse(&["create", "--file", "b.txt", "-t", "image/png"]).is_ok());
    }

    #[test]
    fn test_parse_globals_after_subcommand() {
        let cli = parse(&["list", "--expand", "-vv", "--api-url", "http://fragments:9000"]).unwrap();
        assert!(matches!(cli.command, Commands::List { expand: true }));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.api_url, "http://fragments:9000");
    }

    #[test]
    fn test_verbosity_level() {
        assert_eq!(verbosity_level(0), Level::WARN);
        assert_eq!(verbosity_level(1), Level::INFO);
        assert_eq!(verbosity_level(2), Level::DEBUG);
        assert_eq!(verbosity_level(9), Level::TRACE);
    }

    #[test]
    fn test_required_id_trims() {
        assert_eq!(required_id("  abc \n").unwrap(), "abc");
        assert!(required_id("   ").is_err());
    }

    #[test]
    fn test_create_auth() {
        assert!(create_auth(Some("abc")).is_ok());
        assert!(create_auth(Some("  ")).is_ok());
        assert!(create_auth(None).is_ok());
        assert!(create_auth(Some("bad\ntoken")).is_err());
    }

    #[tokio::test]
    async fn test_content_load() {
        let text = Content {
            text: Some("  trimmed \n".to_string()),
            file: None,
        };
        assert_eq!(text.load().await.unwrap(), Payload::Text("trimmed".to_string()));

        let path = std::env::temp_dir().join(format!("fragments-cli-{}.bin", std::process::id()));
        tokio::fs::write(&path, [0u8, 159, 146, 150]).await.unwrap();
        let file = Content {
            text: None,
            file: Some(path.clone()),
        };
        assert_eq!(file.load().await.unwrap(), Payload::File(vec![0, 159, 146, 150]));
        tokio::fs::remove_file(&path).await.unwrap();

        let missing = Content {
            text: None,
            file: Some(path),
        };
        assert!(missing.load().await.is_err());
    }
}
