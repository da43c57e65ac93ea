//! `portico` command-line entry point.
//!
//! `run` starts the channel loops and waits for Ctrl-C. Every other
//! subcommand opens the same store, does one thing and exits.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use portico_core::{Channel, Identification};
use portico_service::config::OutputDriver;
use portico_service::{Portico, ServiceConfig, open_card_reader};
use portico_storage::EventWithEmployee;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "portico", version, about = "Access-event ingestion and alarm escalation")]
struct Cli {
    /// Configuration file
    #[arg(short, long, env = "PORTICO_CONFIG", default_value = "portico.toml")]
    config: PathBuf,

    /// Override the database path from the configuration
    #[arg(long, env = "PORTICO_DATABASE")]
    database: Option<String>,

    /// Log filter used when RUST_LOG is unset (defaults to `log.level`)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the card and serial channels and run until Ctrl-C.
    Run,

    /// Process one read and print the decision as JSON.
    Event {
        identification: Identification,

        #[arg(long, default_value = "api")]
        channel: Channel,
    },

    /// Manage enrolled employees.
    #[command(subcommand)]
    Employee(EmployeeCommand),

    /// Query the event log.
    #[command(subcommand)]
    Events(EventsCommand),

    /// Print event statistics as JSON.
    Stats,

    /// Send every enrolled employee to the microcontroller.
    Sync,

    /// List serial ports visible on this machine.
    Ports,
}

#[derive(Subcommand, Debug)]
enum EmployeeCommand {
    /// Enroll an employee and mirror it to the device.
    Add {
        identification: Identification,
        name: String,
    },
    /// Rename an employee.
    Update {
        identification: Identification,
        name: String,
    },
    /// Remove an employee and mirror it to the device.
    Remove { identification: Identification },
    /// List employees ordered by name.
    List,
}

#[derive(Subcommand, Debug)]
enum EventsCommand {
    /// Most recent events, newest first.
    Recent {
        #[arg(short = 'n', long)]
        limit: Option<i64>,
    },
    /// Events between two dates (YYYY-MM-DD), both inclusive.
    Range {
        #[arg(value_parser = parse_date)]
        from: NaiveDate,
        #[arg(value_parser = parse_date)]
        to: NaiveDate,
    },
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("{value}: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServiceConfig::load_from_path(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(path) = cli.database.clone() {
        config = config.database_path(path);
    }

    let level = cli.log_level.as_deref().unwrap_or(config.log.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run => run(config).await,
        Commands::Ports => list_ports(),
        Commands::Event {
            identification,
            channel,
        } => {
            let portico = open(config).await?;
            let decision = portico
                .process_event(identification.as_str(), channel)
                .await
                .context("processing event")?;
            println!("{}", serde_json::to_string_pretty(&decision)?);
            portico.shutdown().await;
            Ok(())
        }
        Commands::Employee(command) => employee(open(config).await?, command).await,
        Commands::Events(command) => events(open(read_only(config)).await?, command).await,
        Commands::Stats => {
            let portico = open(read_only(config)).await?;
            let stats = portico.statistics().await.context("reading statistics")?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            portico.shutdown().await;
            Ok(())
        }
        Commands::Sync => {
            let portico = open(config).await?;
            let report = portico
                .admin()
                .sync_employees()
                .await
                .context("syncing employees")?;
            println!(
                "sent {}, failed {}, skipped {}",
                report.sent, report.failed, report.skipped
            );
            portico.shutdown().await;
            Ok(())
        }
    }
}

async fn open(config: ServiceConfig) -> Result<Portico> {
    let path = config.database.path.clone();
    Portico::from_config(config)
        .await
        .with_context(|| format!("opening portico (database {path})"))
}

/// Queries touch neither the serial link nor the alarm line.
fn read_only(mut config: ServiceConfig) -> ServiceConfig {
    config.serial.enabled = false;
    config.alarm.driver = OutputDriver::Mock;
    config
}

async fn run(config: ServiceConfig) -> Result<()> {
    let portico = open(config).await?;

    // The mock feed has to outlive the card loop.
    let _feed = if portico.config().card_reader.enabled {
        match open_card_reader(&portico.config().card_reader) {
            Ok((reader, feed)) => {
                portico.start_card_channel(reader);
                feed
            }
            Err(e) => {
                warn!(error = %e, "card reader unavailable, card channel not started");
                None
            }
        }
    } else {
        None
    };
    portico.start_serial_channel();

    let status = portico.status();
    info!(
        card = status.card_channel_running,
        serial = status.serial_channel_running,
        serial_connected = status.serial_connected,
        "portico running, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    info!("shutting down");
    portico.shutdown().await;
    Ok(())
}

async fn employee(portico: Portico, command: EmployeeCommand) -> Result<()> {
    let admin = portico.admin();
    match command {
        EmployeeCommand::Add {
            identification,
            name,
        } => {
            let outcome = admin
                .add_employee(identification, &name)
                .await
                .context("adding employee")?;
            println!("{}", outcome.message);
        }
        EmployeeCommand::Update {
            identification,
            name,
        } => {
            let outcome = admin
                .update_employee(identification, &name)
                .await
                .context("updating employee")?;
            println!("{}", outcome.message);
        }
        EmployeeCommand::Remove { identification } => {
            let outcome = admin
                .remove_employee(&identification)
                .await
                .context("removing employee")?;
            println!("{}", outcome.message);
        }
        EmployeeCommand::List => {
            for employee in admin.list_employees().await.context("listing employees")? {
                println!("{:<16} {}", employee.identification.as_str(), employee.name);
            }
        }
    }
    portico.shutdown().await;
    Ok(())
}

async fn events(portico: Portico, command: EventsCommand) -> Result<()> {
    let rows = match command {
        EventsCommand::Recent { limit } => portico.latest_events(limit).await,
        EventsCommand::Range { from, to } => portico.events_between(from, to).await,
    }
    .context("querying events")?;

    for row in &rows {
        print_event(row);
    }
    portico.shutdown().await;
    Ok(())
}

fn print_event(row: &EventWithEmployee) {
    let event = &row.event;
    println!(
        "{:>6}  {}  {:<16} {:<8} {:<12} {:<7} {}",
        event.id,
        event.timestamp_string(),
        event.identification.as_str(),
        event.channel.as_str(),
        event.operation.as_str(),
        if event.authorized { "granted" } else { "denied" },
        row.employee_name.as_deref().unwrap_or("-"),
    );
}

fn list_ports() -> Result<()> {
    let ports = serialport::available_ports().context("listing serial ports")?;
    if ports.is_empty() {
        println!("no serial ports found");
    }
    for port in ports {
        println!("{}  {:?}", port.port_name, port.port_type);
    }
    Ok(())
}
