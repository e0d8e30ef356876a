use anyhow::Context;
use clap::{Parser, Subcommand};
use lib::format::SsmlFormatter;
use lib::gateway::InboundRequest;
use lib::normalize::{RawReply, TurnResponse};
use lib::session::ConversationPayload;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the gateway (HTTP). The front end POSTs each turn to `/`.
    Serve {
        /// Config file path (default: PARLEY_CONFIG_PATH or ~/.parley/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 15152)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Normalize a captured dialog engine reply (JSON file) and print answer and instructions.
    Decode {
        /// Reply JSON file; "-" reads stdin.
        #[arg(value_name = "FILE")]
        file: std::path::PathBuf,
    },

    /// Talk to a running gateway (interactive). Starts a session, then sends each line as a question.
    Chat {
        /// Config file path (default: PARLEY_CONFIG_PATH or ~/.parley/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("parley {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Decode { file }) => {
            if let Err(e) = run_decode(&file) {
                log::error!("decode failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { config }) => {
            if let Err(e) = run_chat(config).await {
                log::error!("chat failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    lib::gateway::run_gateway(config).await
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecodeOutput {
    answer: String,
    contains_markup: bool,
    instructions: lib::normalize::InstructionSet,
    diagnostics: Vec<String>,
}

fn run_decode(file: &std::path::Path) -> anyhow::Result<()> {
    let text = if file.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("reading reply from stdin")?
    } else {
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?
    };
    let body: serde_json::Value = serde_json::from_str(&text).context("parsing reply JSON")?;
    let reply = RawReply::from_json(body).context("reply must be a JSON object")?;
    let normalized = lib::normalize::normalize_reply(&reply, &SsmlFormatter)?;
    let out = DecodeOutput {
        answer: normalized.answer,
        contains_markup: normalized.contains_markup,
        instructions: normalized.instructions,
        diagnostics: normalized.diagnostics.iter().map(|d| d.to_string()).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn run_chat(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let (config, _) = lib::config::load_config(config_path)?;
    let url = format!("http://{}:{}/", config.gateway.bind.trim(), config.gateway.port);
    let client = reqwest::Client::new();

    let welcome = turn_via_gateway(&client, &url, &InboundRequest::welcome()).await?;
    print_turn(&welcome);
    let mut conversation: ConversationPayload = welcome.conversation_payload;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }

        let request = InboundRequest::question(input, &conversation);
        match turn_via_gateway(&client, &url, &request).await {
            Ok(res) => {
                print_turn(&res);
                conversation = res.conversation_payload;
            }
            Err(e) => {
                eprintln!("chat error: {:#}", e);
            }
        }
    }

    Ok(())
}

async fn turn_via_gateway(
    client: &reqwest::Client,
    url: &str,
    request: &InboundRequest,
) -> anyhow::Result<TurnResponse> {
    let res = client
        .post(url)
        .json(request)
        .send()
        .await
        .with_context(|| format!("POST {}", url))?;
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        anyhow::bail!("gateway returned {} {}", status, body);
    }
    Ok(res.json().await?)
}

fn print_turn(res: &TurnResponse) {
    println!("< {}", res.answer.trim());
    if !res.instructions.is_empty() {
        println!(
            "  instructions: {}",
            serde_json::to_string(&res.instructions).unwrap_or_default()
        );
    }
}
