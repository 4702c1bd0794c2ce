use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{
    build_record_input, parse_principal, validate_record_id, CanisterActor, ConnectOptions,
    RecordsActor,
};
use shared::domain::MedicalRecord;
use tracing_subscriber::EnvFilter;

mod config;
use config::ConnectionArgs;

#[derive(Parser, Debug)]
#[command(name = "medrec", about = "Command-line client for the medical records canister")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,
    /// Print results as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Diagnostic echo call against the canister.
    Greet { name: String },
    /// Submit a new record; prints the generated record id.
    Add {
        /// One of: diagnosis, prescription, lab_result.
        #[arg(long)]
        category: String,
        #[arg(long)]
        content: String,
    },
    /// List records owned by this identity.
    List,
    /// Grant a provider access to one of your records.
    Share {
        record_id: String,
        /// Provider principal in textual form.
        provider: String,
    },
    /// List records other identities shared with you.
    ListShared,
    /// Revoke a provider's access to one of your records.
    Revoke {
        record_id: String,
        provider: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = config::load_settings(&cli.connection)?;
    let options = ConnectOptions {
        host: settings.host,
        canister_id: settings.canister_id,
        identity_pem: settings.identity_pem,
        fetch_root_key: settings.fetch_root_key,
    };

    let actor = CanisterActor::connect(&options).await?;

    match cli.command {
        Command::Greet { name } => {
            let echo = actor.greet(&name).await?;
            println!("{echo}");
        }
        Command::Add { category, content } => {
            let input = build_record_input(&category, &content)?;
            let record_id = actor.add_record(input).await?;
            if cli.json {
                println!("{}", serde_json::json!({ "record_id": record_id }));
            } else {
                println!("Record added with ID: {record_id}");
            }
        }
        Command::List => {
            let mut records = actor.get_my_records().await?;
            client_core::sort_newest_first(&mut records);
            print_records(&records, cli.json)?;
        }
        Command::Share {
            record_id,
            provider,
        } => {
            let record_id = validate_record_id(&record_id)?;
            let provider = parse_principal(&provider)?;
            let granted = actor.share_with_provider(&record_id, provider).await?;
            if granted {
                println!("Record shared successfully");
            } else {
                println!("Backend refused to share the record (not found or not yours)");
                std::process::exit(1);
            }
        }
        Command::ListShared => {
            let mut records = actor.get_shared_records().await?;
            client_core::sort_newest_first(&mut records);
            print_records(&records, cli.json)?;
        }
        Command::Revoke {
            record_id,
            provider,
        } => {
            let record_id = validate_record_id(&record_id)?;
            let provider = parse_principal(&provider)?;
            let revoked = actor.revoke_access(&record_id, provider).await?;
            if revoked {
                println!("Access revoked");
            } else {
                println!("Backend refused to revoke access (not found or not yours)");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_records(records: &[MedicalRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No records found.");
        return Ok(());
    }

    for record in records {
        let created = record
            .created_at()
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| format!("{} ns", record.timestamp));
        println!("[{}] {}", record.record_type.to_uppercase(), record.id);
        println!("  content: {}", record.content);
        println!("  created: {created}");
        println!("  shared with: {} provider(s)", record.authorized_providers.len());
    }
    Ok(())
}
