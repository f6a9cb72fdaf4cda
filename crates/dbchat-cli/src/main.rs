//! dbchat CLI - chat with a MySQL database through an MCP tool server
//!
//! Run with:
//! OPENAI_API_KEY="your-key" dbchat
//!
//! Or against an explicit tool server:
//! OPENAI_API_KEY="your-key" dbchat --mcp-url http://localhost:8000/mcp

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use console::style;
use futures::StreamExt;
use tracing::info;

use dbchat_core::{
    ChatSession, Config, GenAiModel, McpEndpoint, McpToolProvider, DEFAULT_DB_SYSTEM_PROMPT,
};
use dbchat_mcp::{HttpTransport, StdioTransport};

#[derive(Parser)]
#[command(name = "dbchat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AI database assistant with MCP tool calling", long_about = None)]
struct Cli {
    /// Path to the config file (defaults to the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model to use (defaults to the configured model)
    #[arg(short, long)]
    model: Option<String>,

    /// MCP server URL, e.g. http://localhost:8000/mcp
    #[arg(long)]
    mcp_url: Option<String>,

    /// Iteration budget per message
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Stream the response instead of waiting for the full answer
    /// (tool calls are disabled in this mode)
    #[arg(short, long)]
    streaming: bool,

    /// Execute a single prompt and exit (non-interactive mode)
    #[arg(long)]
    one_shot: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Warn level by default so logs don't interfere with the prompt
    tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            "info,dbchat_core=debug,dbchat_mcp=debug"
        } else {
            "warn"
        })
        .init();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let mut config = Config::load(&config_path)?;

    if let Some(model) = &cli.model {
        config.provider.model = model.clone();
    }
    if let Some(url) = &cli.mcp_url {
        config.mcp.url = Some(url.clone());
    }
    if let Some(budget) = cli.max_iterations {
        config.provider.max_iterations = budget;
    }

    let api_key = config.provider.get_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured. Set {} or add api_key to {}",
            config.provider.api_key_env,
            config_path.display()
        )
    })?;

    let model = Arc::new(GenAiModel::with_api_key(&api_key, Some(&config.provider.model)));

    let mut session = match config.mcp.endpoint() {
        McpEndpoint::Http(url) => {
            info!(%url, "Connecting to MCP server over HTTP");
            let provider = McpToolProvider::connect(HttpTransport::new(&url)).await?;
            ChatSession::connect(model, Arc::new(provider)).await?
        }
        McpEndpoint::Stdio { command, args } => {
            info!(%command, "Spawning MCP server over stdio");
            let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
            let transport = StdioTransport::spawn(&command, &arg_refs).await?;
            let provider = McpToolProvider::connect(transport).await?;
            ChatSession::connect(model, Arc::new(provider)).await?
        }
        McpEndpoint::Disabled => {
            eprintln!(
                "{} no MCP server configured; running without database tools",
                style("warning:").yellow().bold()
            );
            ChatSession::without_tools(model)
        }
    };

    if let Some(prompt) = cli.one_shot {
        return run_one_shot(&mut session, &config, &prompt, cli.streaming).await;
    }

    run_interactive(&mut session, &config, cli.streaming).await
}

async fn run_one_shot(
    session: &mut ChatSession,
    config: &Config,
    prompt: &str,
    streaming: bool,
) -> anyhow::Result<()> {
    if streaming {
        stream_reply(session, prompt).await?;
    } else {
        let outcome = session
            .chat_with_budget(
                prompt,
                Some(DEFAULT_DB_SYSTEM_PROMPT),
                config.provider.max_iterations,
            )
            .await?;
        println!("{}", outcome.into_text());
    }
    Ok(())
}

async fn run_interactive(
    session: &mut ChatSession,
    config: &Config,
    streaming: bool,
) -> anyhow::Result<()> {
    println!("{}", style("=== dbchat ===").cyan().bold());
    println!("Model: {}", config.provider.model);
    println!("Tools: {}", session.signatures().len());
    println!("Type 'quit' or 'exit' to quit, '/help' for commands");
    println!();

    loop {
        print!("{} ", style("You:").green().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            println!("Goodbye!");
            break;
        }
        if input.starts_with('/') {
            handle_slash_command(input, session);
            continue;
        }

        if streaming {
            print!("{} ", style("Assistant:").blue().bold());
            io::stdout().flush()?;
            if let Err(err) = stream_reply(session, input).await {
                eprintln!("{} {}", style("error:").red().bold(), err);
            }
        } else {
            match session
                .chat_with_budget(
                    input,
                    Some(DEFAULT_DB_SYSTEM_PROMPT),
                    config.provider.max_iterations,
                )
                .await
            {
                Ok(outcome) => {
                    println!("{} {}", style("Assistant:").blue().bold(), outcome.into_text());
                }
                Err(err) => {
                    eprintln!("{} {}", style("error:").red().bold(), err);
                }
            }
        }
        println!();
    }

    Ok(())
}

/// Stream a reply fragment by fragment, flushing as text arrives
async fn stream_reply(session: &mut ChatSession, prompt: &str) -> anyhow::Result<()> {
    let mut stream = Box::pin(session.chat_streaming(prompt, Some(DEFAULT_DB_SYSTEM_PROMPT)));
    while let Some(fragment) = stream.next().await {
        print!("{}", fragment?);
        io::stdout().flush()?;
    }
    println!();
    Ok(())
}

fn handle_slash_command(input: &str, session: &mut ChatSession) {
    match input {
        "/help" => {
            println!("Commands:");
            println!("  /help     Show this help");
            println!("  /tools    List available database tools");
            println!("  /history  Show the conversation history");
            println!("  /reset    Clear the conversation");
        }
        "/tools" => {
            if session.signatures().is_empty() {
                println!("No tools available");
            } else {
                for sig in session.signatures() {
                    println!("  {} - {}", style(&sig.name).bold(), sig.description);
                }
            }
        }
        "/history" => {
            for turn in session.history() {
                let content = turn.content.as_deref().unwrap_or("(tool calls)");
                println!("  [{}] {}", turn.role, content);
            }
        }
        "/reset" => {
            session.reset();
            println!("Conversation cleared");
        }
        other => {
            println!("Unknown command: {} (try /help)", other);
        }
    }
}
