//! Pet records CLI.
//!
//! Provides the `pets` binary, a thin operator surface over
//! [`PetGateway`]. Every subcommand goes through the same address-based
//! CRUD contract the gateway exposes to any other caller.
//!
//! Reads configuration from the environment:
//! - `PETS_DB_PATH`: SQLite database file path (default: "pets.db"),
//!   overridden by `--db`.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use pets_core::{AddressMatcher, CorrectionMode, PetFields, PetId};
use pets_storage::{
    Column, DbLocation, GatewayConfig, GatewayError, PetGateway, SchemaPolicy, Sort,
    StorageEngine, UpdateOutcome,
};

/// Pet records store.
#[derive(Parser)]
#[command(name = "pets", about = "Manage pet records")]
struct Cli {
    /// Path to the pets database file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Migrate older schemas in place instead of dropping the table.
    #[arg(long, global = true)]
    additive: bool,

    /// Correct only the first invalid field per write, as the legacy store did.
    #[arg(long, global = true)]
    first_match: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List every pet.
    List {
        /// Column to sort by.
        #[arg(long, value_enum, default_value = "id")]
        sort: SortKey,

        /// Sort descending.
        #[arg(long)]
        desc: bool,
    },

    /// Show one pet.
    Show {
        id: i64,
    },

    /// Add a pet.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        breed: Option<String>,
        /// 0 = unknown, 1 = male, 2 = female.
        #[arg(long, allow_negative_numbers = true)]
        gender: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        weight: Option<i64>,
    },

    /// Change fields of one pet. Omitted fields are left as they are.
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        breed: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        gender: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        weight: Option<i64>,
    },

    /// Delete one pet.
    Remove {
        id: i64,
    },

    /// Delete every pet.
    Clear,

    /// Print the type tag of an address.
    Type {
        address: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortKey {
    Id,
    Name,
    Breed,
    Gender,
    Weight,
}

impl From<SortKey> for Column {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Id => Column::Id,
            SortKey::Name => Column::Name,
            SortKey::Breed => Column::Breed,
            SortKey::Gender => Column::Gender,
            SortKey::Weight => Column::Weight,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let db_path = cli
        .db
        .clone()
        .or_else(|| std::env::var_os("PETS_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("pets.db"));
    let policy = if cli.additive {
        SchemaPolicy::Additive
    } else {
        SchemaPolicy::Destructive
    };
    let config = GatewayConfig {
        correction: if cli.first_match {
            CorrectionMode::FirstMatch
        } else {
            CorrectionMode::AllFields
        },
        ..GatewayConfig::default()
    };

    let gateway = PetGateway::new(
        StorageEngine::new(DbLocation::File(db_path), policy),
        AddressMatcher::default(),
        config,
    );
    gateway.register_observer(Arc::new(|address: &str| {
        tracing::info!("changed: {}", address);
    }));

    let exit_code = match run(&gateway, cli.command) {
        Ok(()) => 0,
        Err(err) => report(&err),
    };
    process::exit(exit_code);
}

/// Execute one subcommand, printing its result as JSON.
fn run(gateway: &PetGateway, command: Commands) -> Result<(), GatewayError> {
    let matcher = gateway.matcher();
    let collection = matcher.collection_address();

    match command {
        Commands::List { sort, desc } => {
            let key = if desc {
                Sort::desc(sort.into())
            } else {
                Sort::asc(sort.into())
            };
            let records = gateway
                .query(&collection, &[], None, &[key])?
                .into_records()?;
            print_json(&records);
        }
        Commands::Show { id } => {
            let address = matcher.item_address(PetId(id));
            let records = gateway.query(&address, &[], None, &[])?.into_records()?;
            match records.first() {
                Some(record) => print_json(record),
                None => print_json(&serde_json::Value::Null),
            }
        }
        Commands::Add {
            name,
            breed,
            gender,
            weight,
        } => {
            let fields = PetFields {
                name: Some(name),
                breed,
                gender,
                weight,
            };
            let address = gateway.insert(&collection, &fields)?;
            print_json(&serde_json::json!({ "address": address }));
        }
        Commands::Edit {
            id,
            name,
            breed,
            gender,
            weight,
        } => {
            let fields = PetFields {
                name,
                breed,
                gender,
                weight,
            };
            let address = matcher.item_address(PetId(id));
            match gateway.update(&address, &fields, None)? {
                UpdateOutcome::Updated(count) => {
                    print_json(&serde_json::json!({ "updated": count }));
                }
                UpdateOutcome::Rejected(failure) => {
                    return Err(GatewayError::Validation(failure));
                }
            }
        }
        Commands::Remove { id } => {
            let removed = gateway.delete(&matcher.item_address(PetId(id)), None)?;
            print_json(&serde_json::json!({ "deleted": removed }));
        }
        Commands::Clear => {
            let removed = gateway.delete(&collection, None)?;
            print_json(&serde_json::json!({ "deleted": removed }));
        }
        Commands::Type { address } => {
            let tag = gateway.type_of(&address)?;
            print_json(&serde_json::json!({ "type": tag }));
        }
    }
    Ok(())
}

/// Print an error and map it to an exit code: 1 = rejected input,
/// 2 = unknown address or unsupported operation, 3 = storage failure.
fn report(err: &GatewayError) -> i32 {
    match err {
        GatewayError::Validation(failure) => {
            eprintln!("Error: {} (code {})", failure, failure.code());
            1
        }
        GatewayError::Address(_) | GatewayError::Unsupported { .. } => {
            eprintln!("Error: {}", err);
            2
        }
        GatewayError::InsertFailed { .. } | GatewayError::Storage(_) => {
            eprintln!("Storage error: {}", err);
            3
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", json);
}
