mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use service_facts::{Config, Format};

#[derive(Parser)]
#[command(name = "service-facts")]
#[command(about = "Collect normalized service and socket facts for this host")]
struct Args {
    /// Filesystem root for release files, rc.d links and Upstart jobs
    #[arg(long, global = true, default_value = "/")]
    root: PathBuf,

    /// Timeout for each external command, in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// Runlevel whose rc.d directory is scanned
    #[arg(long, global = true, default_value_t = service_facts::config::DEFAULT_RUNLEVEL)]
    runlevel: u8,

    /// Never prefix legacy commands with sudo
    #[arg(long, global = true)]
    no_sudo: bool,

    /// Log progress to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o', global = true)]
    output: Option<PathBuf>,

    /// Output encoding
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Single-line JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Collect the report (default)
    Collect,

    /// Show the detected host profile and which sources apply
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Msgpack,
}

fn report_format(format: OutputFormat, compact: bool) -> Format {
    match (format, compact) {
        (OutputFormat::Msgpack, _) => Format::MsgPack,
        (OutputFormat::Json, true) => Format::CompactJson,
        (OutputFormat::Json, false) => Format::Json,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = Config {
        root: args.root,
        command_timeout: Duration::from_secs(args.timeout),
        runlevel: args.runlevel,
        elevate: if args.no_sudo { Vec::new() } else { vec!["sudo".to_string()] },
    };
    config.validate()?;

    let format = report_format(args.format, args.compact);

    match args.command.unwrap_or(Command::Collect) {
        Command::Collect => {
            commands::collect(config, args.output.as_deref(), format).await?;
        }
        Command::Profile => {
            commands::profile(&config);
        }
    }

    Ok(())
}
