//! Roster CLI

use clap::{Parser, Subcommand};
use roster::config::{self, Config, ServeConfig, StoreKind};
use roster::{api, MarkdownStore, StudentService};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Student roster with seat-number allocation", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store layout and git repository
    Init,

    /// Run the HTTP API
    Serve(ServeConfig),

    /// Print every record
    List,

    /// Check an account identifier
    Validate {
        /// Identifier to check, e.g. tkubm1760
        account: String,
    },

    /// Report seat numbers held by more than one record
    Audit,

    /// Show store status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    config::init_logging(cli.config.log_json)?;

    match cli.command {
        Commands::Init => init_store(&cli.config).await,
        Commands::Serve(serve) => run_server(&cli.config, &serve).await,
        Commands::List => list_students(&cli.config).await,
        Commands::Validate { account } => validate_account(&cli.config, &account).await,
        Commands::Audit => audit_seats(&cli.config).await,
        Commands::Status => show_status(&cli.config).await,
    }
}

async fn open_service(config: &Config) -> anyhow::Result<StudentService> {
    let store = config.open_store().await?;
    Ok(StudentService::new(store))
}

async fn init_store(config: &Config) -> anyhow::Result<ExitCode> {
    if config.store == StoreKind::Memory {
        println!("Nothing to initialize for the memory store.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Initializing roster at {:?}...", config.database);
    let store = MarkdownStore::open(&config.database).await?;

    println!("Roster initialized successfully!");
    println!();
    println!("Records are kept in {:?}", store.path);
    println!();
    println!("Get started:");
    println!("  roster serve --bind {}", config::DEFAULT_BIND);
    println!("  roster validate tkubm1760");

    Ok(ExitCode::SUCCESS)
}

async fn run_server(config: &Config, serve: &ServeConfig) -> anyhow::Result<ExitCode> {
    let service = open_service(config).await?;
    api::serve(Arc::new(service), serve.bind).await?;
    Ok(ExitCode::SUCCESS)
}

async fn list_students(config: &Config) -> anyhow::Result<ExitCode> {
    let service = open_service(config).await?;
    let envelope = service.list_all().await;

    let Some(students) = envelope.body else {
        anyhow::bail!("{}", envelope.message);
    };

    if students.is_empty() {
        println!("No students found.");
        return Ok(ExitCode::SUCCESS);
    }

    for student in &students {
        let profile = &student.profile;
        println!("--- {} ---", student.id);
        println!("  seat:       {}", student.seat_number);
        println!("  account:    {}", profile.account);
        println!("  name:       {}", profile.name);
        println!("  department: {}", profile.department);
        println!("  grade:      {}", profile.grade_year);
        println!("  class:      {}", profile.class_name);
        println!("  email:      {}", profile.email);
    }
    println!("({} student(s))", students.len());

    Ok(ExitCode::SUCCESS)
}

async fn validate_account(config: &Config, account: &str) -> anyhow::Result<ExitCode> {
    let service = open_service(config).await?;
    let envelope = service.validate_identifier(account).await;

    match envelope.body {
        Some(outcome) if outcome.is_valid() => {
            println!("{}: {}", account, envelope.message);
            Ok(ExitCode::SUCCESS)
        }
        Some(outcome) => {
            println!("{}: {:?} ({})", account, outcome, envelope.message);
            Ok(ExitCode::FAILURE)
        }
        None => anyhow::bail!("{}", envelope.message),
    }
}

async fn audit_seats(config: &Config) -> anyhow::Result<ExitCode> {
    let service = open_service(config).await?;
    let envelope = service.audit_seats().await;

    let Some(conflicts) = envelope.body else {
        anyhow::bail!("{}", envelope.message);
    };

    if conflicts.is_empty() {
        println!("No duplicate seat numbers.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Duplicate seat numbers:");
    for conflict in &conflicts {
        println!("  {}: {}", conflict.seat_number, conflict.ids.join(", "));
    }
    Ok(ExitCode::FAILURE)
}

async fn show_status(config: &Config) -> anyhow::Result<ExitCode> {
    println!("Roster Status");
    println!("=============");
    println!("Store: {:?}", config.store);
    println!("Path: {:?}", config.database);
    println!();

    if config.store == StoreKind::Memory {
        println!("Memory store holds nothing between runs.");
        return Ok(ExitCode::SUCCESS);
    }

    let store = Arc::new(MarkdownStore::open(&config.database).await?);
    let service = StudentService::new(store.clone());
    println!("Connected: {}", service.is_connected());

    let envelope = service.list_all().await;
    match &envelope.body {
        Some(students) => println!("Students: {}", students.len()),
        None => println!("Students: unavailable ({})", envelope.message),
    }

    println!("Commits: {}", store.commit_count().await?);
    println!("Last commit: {}", store.last_commit_message().await?);

    if store.has_uncommitted_changes().await? {
        println!("\nUncommitted changes detected.");
    } else {
        println!("\nNo uncommitted changes.");
    }

    Ok(ExitCode::SUCCESS)
}
