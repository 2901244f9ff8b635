//! glassadmin - run one administrative command against a server

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use glassadmin_client::{init_logging, AdminClient, ClientConfig, LoggingListener};
use glassadmin_core::domain::{
    Command, CommandResult, CommandScope, ResponseFormat, ResultValue, ServerDescriptor, Transport,
    ValueKind,
};
use glassadmin_core::port::ServerEntity;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tabled::{Table, Tabled};

#[derive(Parser)]
#[command(name = "glassadmin")]
#[command(about = "Run an administrative command against an application server", long_about = None)]
#[command(version)]
struct Cli {
    /// Server description (JSON)
    #[arg(long, env = "GLASSADMIN_SERVER")]
    server: PathBuf,

    /// Command name, e.g. version or list-applications
    command: String,

    /// Primary operand
    operand: Option<String>,

    #[arg(long, value_enum, default_value = "remote")]
    transport: TransportArg,

    /// Shape of the expected result
    #[arg(long, value_enum, default_value = "text")]
    value: ValueArg,

    #[arg(long)]
    target: Option<String>,

    /// Named parameter as key=value, repeatable
    #[arg(long = "param", value_parser = parse_pair)]
    params: Vec<(String, String)>,

    /// Property as key=value, repeatable
    #[arg(long = "property", value_parser = parse_pair)]
    properties: Vec<(String, String)>,

    /// Artifact to upload (deploy)
    #[arg(long)]
    upload: Option<PathBuf>,

    /// Treat a WARNING exit code as success
    #[arg(long)]
    accept_warning: bool,

    /// Stop waiting after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum TransportArg {
    Remote,
    Cli,
    Jvm,
}

#[derive(Clone, Copy, ValueEnum)]
enum ValueArg {
    Text,
    List,
    Map,
    Log,
}

#[derive(Tabled)]
struct PropertyRow {
    key: String,
    value: String,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw}"))
}

fn build_command(cli: &Cli) -> Command {
    let transport = match cli.transport {
        TransportArg::Remote => Transport::Remote,
        TransportArg::Cli => Transport::LocalCli,
        TransportArg::Jvm => Transport::LocalJvm,
    };
    let (value_kind, format) = match cli.value {
        ValueArg::Text => (ValueKind::Text, ResponseFormat::Json),
        ValueArg::List => (ValueKind::List, ResponseFormat::Json),
        ValueArg::Map => (ValueKind::Map, ResponseFormat::Json),
        ValueArg::Log => (ValueKind::Log, ResponseFormat::PlainText),
    };
    let value_kind = if transport == Transport::LocalJvm {
        ValueKind::Process
    } else {
        value_kind
    };

    let mut command = Command::new(cli.command.clone())
        .with_transport(transport)
        .with_value_kind(value_kind)
        .with_response_format(format);
    if let Some(target) = &cli.target {
        command = command.with_scope(CommandScope::Target {
            target: Some(target.clone()),
        });
    }
    if let Some(operand) = &cli.operand {
        command = command.with_operand(operand.clone());
    }
    if let Some(upload) = &cli.upload {
        command = command.with_upload(upload.clone());
    }
    for (k, v) in &cli.params {
        command = command.with_param(k.clone(), v.clone());
    }
    for (k, v) in &cli.properties {
        command = command.with_property(k.clone(), v.clone());
    }
    if cli.accept_warning {
        command = command.accepting_warning();
    }
    command
}

async fn print_result(result: CommandResult) -> Result<bool> {
    if !result.is_success() {
        eprintln!(
            "{} {}",
            result.state().to_string().red().bold(),
            result.message().unwrap_or_default()
        );
        if !result.auth_ok() {
            eprintln!("{}", "Check the admin user and password".yellow());
        }
        return Ok(false);
    }
    if result.retry_requested() {
        eprintln!("{}", "Server asked to retry later".yellow());
    }

    match result.into_value() {
        Some(ResultValue::Text(text)) => println!("{text}"),
        Some(ResultValue::List(items)) => items.iter().for_each(|i| println!("{i}")),
        Some(ResultValue::Map(map)) => {
            let rows = map.into_iter().map(|(key, value)| PropertyRow { key, value });
            println!("{}", Table::new(rows));
        }
        Some(ResultValue::Log(log)) => {
            log.lines.iter().for_each(|l| println!("{l}"));
            if let Some(next) = log.next_url {
                eprintln!("{} {next}", "next:".dimmed());
            }
        }
        Some(ResultValue::Process(mut process)) => {
            eprintln!("{} pid {:?}", "started".green(), process.pid);
            while let Some(line) = process.output.recv().await {
                println!("{line}");
            }
            let status = process.child.wait().await.context("waiting for server process")?;
            return Ok(status.success());
        }
        None => {}
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let raw = std::fs::read_to_string(&cli.server)
        .with_context(|| format!("reading {}", cli.server.display()))?;
    let server: ServerDescriptor = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", cli.server.display()))?;
    let server: Arc<dyn ServerEntity> = Arc::new(server);

    let client = AdminClient::new(ClientConfig::from_env())
        .map_err(|e| anyhow!("{e}"))?
        .with_listener(Arc::new(LoggingListener));

    let command = build_command(&cli);
    let outcome = match cli.timeout_secs {
        Some(secs) => client.exec_timeout(server, command, Duration::from_secs(secs)).await,
        None => client.exec(server, command).await,
    };
    let success = match outcome {
        Ok(result) => print_result(result).await?,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            false
        }
    };

    client.shutdown().await;
    if !success {
        std::process::exit(1);
    }
    Ok(())
}
