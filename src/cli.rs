//! Command-line interface for the harvester.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::client::Client;
use crate::datestamp;
use crate::error::Result;
use crate::types::Record;

/// oai-harvest - Harvest metadata from OAI-PMH repositories.
#[derive(Parser)]
#[command(name = "oai-harvest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments shared by the selective-harvesting commands.
#[derive(Args)]
pub struct SelectionArgs {
    /// Metadata prefix to harvest in
    #[arg(short, long, default_value = "oai_dc")]
    pub prefix: String,

    /// Lower datestamp bound (YYYY-MM-DD or YYYY-MM-DDThh:mm:ssZ)
    #[arg(long)]
    pub from: Option<String>,

    /// Upper datestamp bound (YYYY-MM-DD or YYYY-MM-DDThh:mm:ssZ)
    #[arg(long)]
    pub until: Option<String>,

    /// Restrict the harvest to one set
    #[arg(short, long)]
    pub set: Option<String>,

    /// Stop after this many items
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the repository's Identify response.
    Identify {
        /// Repository base URL
        base_url: String,
    },

    /// List the metadata formats the repository disseminates.
    Formats {
        /// Repository base URL
        base_url: String,

        /// Restrict to formats available for one item
        #[arg(short, long)]
        identifier: Option<String>,
    },

    /// Fetch a single record as JSON.
    Record {
        /// Repository base URL
        base_url: String,

        /// Item identifier
        identifier: String,

        /// Metadata prefix to disseminate in
        #[arg(short, long, default_value = "oai_dc")]
        prefix: String,
    },

    /// Harvest record headers as JSON lines.
    Identifiers {
        /// Repository base URL
        base_url: String,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Harvest full records as JSON lines.
    Records {
        /// Repository base URL
        base_url: String,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// List the repository's sets.
    Sets {
        /// Repository base URL
        base_url: String,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Identify { base_url } => identify_command(&base_url),
        Commands::Formats {
            base_url,
            identifier,
        } => formats_command(&base_url, identifier.as_deref()),
        Commands::Record {
            base_url,
            identifier,
            prefix,
        } => record_command(&base_url, &identifier, &prefix),
        Commands::Identifiers {
            base_url,
            selection,
        } => identifiers_command(&base_url, &selection),
        Commands::Records {
            base_url,
            selection,
        } => records_command(&base_url, &selection),
        Commands::Sets { base_url } => sets_command(&base_url),
    }
}

fn identify_command(base_url: &str) -> Result<()> {
    let client = Client::new(base_url)?;
    let identify = client.identify()?;

    println!(
        "{} {}",
        style("Repository:").bold(),
        style(&identify.repository_name).cyan()
    );
    println!("  Base URL: {}", identify.base_url);
    println!("  Protocol version: {}", identify.protocol_version);
    println!(
        "  Earliest datestamp: {}",
        datestamp::encode(&identify.earliest_datestamp)
    );
    println!("  Deleted records: {}", identify.deleted_record.as_str());
    println!("  Granularity: {}", identify.granularity);
    for email in &identify.admin_emails {
        println!("  Admin: {email}");
    }
    Ok(())
}

fn formats_command(base_url: &str, identifier: Option<&str>) -> Result<()> {
    let client = Client::new(base_url)?;
    let formats = client.list_metadata_formats(identifier)?;

    for format in formats {
        println!(
            "{}  {}  {}",
            style(&format.prefix).cyan(),
            format.namespace,
            format.schema
        );
    }
    Ok(())
}

fn record_command(base_url: &str, identifier: &str, prefix: &str) -> Result<()> {
    let client = Client::new(base_url)?;
    let record = client.get_record(identifier, prefix)?;
    print_json(&record);
    Ok(())
}

fn identifiers_command(base_url: &str, selection: &SelectionArgs) -> Result<()> {
    let client = Client::new(base_url)?;
    let (from, until) = parse_bounds(selection)?;

    let headers = client.list_identifiers(&selection.prefix, from, until, selection.set.as_deref());
    let mut count = 0usize;
    for header in bounded(headers, selection.limit) {
        print_json(&header?);
        count += 1;
    }
    eprintln!("{} {count} headers", style("Harvested").green().bold());
    Ok(())
}

fn records_command(base_url: &str, selection: &SelectionArgs) -> Result<()> {
    let client = Client::new(base_url)?;
    let (from, until) = parse_bounds(selection)?;

    let pb = harvest_spinner();
    let records = client.list_records(&selection.prefix, from, until, selection.set.as_deref());

    let mut count = 0usize;
    for record in bounded(records, selection.limit) {
        let record: Record = match record {
            Ok(record) => record,
            Err(e) => {
                pb.finish_and_clear();
                return Err(e);
            }
        };
        print_json(&record);
        count += 1;
        pb.set_message(format!("{count} records"));
        pb.tick();
    }

    pb.finish_and_clear();
    eprintln!("{} {count} records", style("Harvested").green().bold());
    Ok(())
}

fn sets_command(base_url: &str) -> Result<()> {
    let client = Client::new(base_url)?;
    for set in client.list_sets() {
        let set = set?;
        println!("{}  {}", style(&set.spec).cyan(), set.name);
    }
    Ok(())
}

/// Parse the optional from/until bounds of a selection.
fn parse_bounds(
    selection: &SelectionArgs,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let from = selection
        .from
        .as_deref()
        .map(datestamp::decode)
        .transpose()?;
    let until = selection
        .until
        .as_deref()
        .map(datestamp::decode)
        .transpose()?;
    Ok((from, until))
}

/// Apply an optional item limit to a harvest iterator.
fn bounded<I: Iterator>(iter: I, limit: Option<usize>) -> impl Iterator<Item = I::Item> {
    iter.take(limit.unwrap_or(usize::MAX))
}

/// Progress spinner for long-running harvests. Progress goes to
/// stderr, records to stdout.
fn harvest_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb
}

/// Print a value as one JSON line on stdout.
fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "failed to serialize item"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_identify() {
        let cli = Cli::parse_from(["oai-harvest", "identify", "http://example.org/oai"]);
        let Commands::Identify { base_url } = cli.command else {
            panic!("expected identify command");
        };
        assert_eq!(base_url, "http://example.org/oai");
    }

    #[test]
    fn test_cli_parse_records_with_selection() {
        let cli = Cli::parse_from([
            "oai-harvest",
            "records",
            "http://example.org/oai",
            "--prefix",
            "marcxml",
            "--from",
            "2024-01-01",
            "--set",
            "physics",
            "--limit",
            "10",
        ]);

        let Commands::Records {
            base_url,
            selection,
        } = cli.command
        else {
            panic!("expected records command");
        };
        assert_eq!(base_url, "http://example.org/oai");
        assert_eq!(selection.prefix, "marcxml");
        assert_eq!(selection.from.as_deref(), Some("2024-01-01"));
        assert_eq!(selection.set.as_deref(), Some("physics"));
        assert_eq!(selection.limit, Some(10));
    }

    #[test]
    fn test_cli_parse_record_default_prefix() {
        let cli = Cli::parse_from([
            "oai-harvest",
            "record",
            "http://example.org/oai",
            "oai:example:1",
        ]);

        let Commands::Record { prefix, identifier, .. } = cli.command else {
            panic!("expected record command");
        };
        assert_eq!(prefix, "oai_dc");
        assert_eq!(identifier, "oai:example:1");
    }

    #[test]
    fn test_parse_bounds_rejects_garbage() {
        let selection = SelectionArgs {
            prefix: "oai_dc".to_string(),
            from: Some("not-a-date".to_string()),
            until: None,
            set: None,
            limit: None,
        };
        assert!(parse_bounds(&selection).is_err());
    }
}
