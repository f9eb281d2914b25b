//! beacon-node: operator CLI for the beacon oracle.
//!
//! Each invocation loads the persisted oracle state from
//! `$BEACON_DATA_DIR/beacon.db`, runs one command and prints the result as
//! JSON on stdout.

mod commands;
mod config;

use std::path::PathBuf;

use beacon_types::{SignedWord, ZERO_ID};
use clap::{Parser, Subcommand};
use tracing::info;
use zeroize::Zeroizing;

use crate::commands::Node;
use crate::config::{parse_id, NodeConfig};

/// Beacon oracle node
#[derive(Parser, Debug)]
#[command(name = "beacon-node")]
#[command(about = "Verify, aggregate and serve reporter-signed data feeds")]
struct Cli {
    /// Current Unix time to evaluate freshness against. Defaults to the system clock.
    #[arg(long, global = true)]
    now: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a reporter keypair
    Keygen,
    /// Register a template for a reporter
    RegisterTemplate {
        /// Reporter identity (hex)
        reporter: String,
        /// Endpoint identifier (hex)
        endpoint: String,
        /// Template parameters (hex)
        #[arg(default_value = "")]
        parameters: String,
    },
    /// Sign an observation and print it as JSON
    Sign {
        /// Reporter secret key (hex)
        secret: String,
        /// Template identifier (hex)
        template: String,
        /// Observation timestamp (Unix seconds)
        timestamp: u64,
        /// Value as a signed decimal integer
        #[arg(allow_hyphen_values = true)]
        value: String,
        /// Produce a parameterized observation with these parameters (hex)
        #[arg(long)]
        parameters: Option<String>,
    },
    /// Submit a signed observation from a JSON file
    Submit { path: PathBuf },
    /// Submit a parameterized observation from a JSON file
    SubmitParameterized { path: PathBuf },
    /// Aggregate the stored values of two or more feeds
    Aggregate {
        /// Member feed identifiers (hex), in order
        #[arg(required = true)]
        members: Vec<String>,
    },
    /// Aggregate a JSON array of observations; unsigned entries use stored values
    AggregateSigned { path: PathBuf },
    /// Point an alias at a feed
    SetAlias {
        name: String,
        /// Feed identifier (hex)
        feed_id: String,
        /// Identity performing the change (hex)
        setter: String,
    },
    /// Read a feed
    Read {
        /// Feed identifier (hex)
        feed_id: String,
        /// Reader identity (hex). Defaults to the anyone identity.
        reader: Option<String>,
        /// Fail when the feed has no data
        #[arg(long)]
        value_only: bool,
    },
    /// Read the feed an alias points at
    ReadAlias {
        name: String,
        /// Reader identity (hex). Defaults to the anyone identity.
        reader: Option<String>,
    },
    /// Show the logged events of a feed
    History {
        /// Feed identifier (hex)
        feed_id: String,
    },
}

fn system_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn reader_id(reader: Option<&str>) -> anyhow::Result<[u8; 32]> {
    reader.map_or(Ok(ZERO_ID), |r| parse_id("reader", r))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = NodeConfig::load()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("beacon={}", config.advanced.log_level).parse()?),
        )
        .init();

    let now = cli.now.unwrap_or_else(system_now);

    let open_node = || -> anyhow::Result<Node> {
        info!(data_dir = %config.data_dir().display(), "opening oracle state");
        Node::open(&config)
    };

    let output = match cli.command {
        Command::Keygen => commands::keygen(),
        Command::Sign {
            secret,
            template,
            timestamp,
            value,
            parameters,
        } => {
            let parameters = parameters.map(hex::decode).transpose()?;
            commands::sign(
                &Zeroizing::new(parse_id("secret", &secret)?),
                parse_id("template", &template)?,
                timestamp,
                value.parse::<SignedWord>()?,
                parameters,
            )?
        }
        Command::RegisterTemplate {
            reporter,
            endpoint,
            parameters,
        } => open_node()?.register_template(
            parse_id("reporter", &reporter)?,
            parse_id("endpoint", &endpoint)?,
            &hex::decode(parameters)?,
        )?,
        Command::Submit { path } => open_node()?.submit(&commands::read_json(&path)?, now)?,
        Command::SubmitParameterized { path } => {
            open_node()?.submit_parameterized(&commands::read_json(&path)?, now)?
        }
        Command::Aggregate { members } => {
            let members = members
                .iter()
                .map(|m| parse_id("member", m))
                .collect::<anyhow::Result<Vec<_>>>()?;
            open_node()?.aggregate(&members)?
        }
        Command::AggregateSigned { path } => {
            let batch: Vec<_> = commands::read_json(&path)?;
            open_node()?.aggregate_signed(&batch, now)?
        }
        Command::SetAlias {
            name,
            feed_id,
            setter,
        } => open_node()?.set_alias(
            parse_id("setter", &setter)?,
            &name,
            parse_id("feed_id", &feed_id)?,
        )?,
        Command::Read {
            feed_id,
            reader,
            value_only,
        } => {
            let feed_id = parse_id("feed_id", &feed_id)?;
            let reader = reader_id(reader.as_deref())?;
            let node = open_node()?;
            if value_only {
                node.read_value(&feed_id, &reader, now)?
            } else {
                node.read(&feed_id, &reader, now)?
            }
        }
        Command::ReadAlias { name, reader } => {
            open_node()?.read_alias(&name, &reader_id(reader.as_deref())?, now)?
        }
        Command::History { feed_id } => open_node()?.history(&parse_id("feed_id", &feed_id)?)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
