//! Resmeta CLI - Admin Command Line Interface
//!
//! Inspect address templates, the persistent metadata database and run the
//! metadata pipeline against canned responses.

mod fixture;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use fixture::FixtureDispatcher;
use resmeta_common::Config;
use resmeta_dmr::ResourceAddress;
use resmeta_meta::{MetadataProcessor, MetadataRegistry, RequiredResources, TemplateResolver};
use resmeta_store::{MetaDatabase, MetaTable, RedbDatabase, WorkerChannel};
use resmeta_template::{AddressTemplate, SelectionContext, Tuple, UnresolvePolicy};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "resmeta-cli")]
#[command(about = "Resmeta Admin CLI")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "resmeta.toml", env = "RESMETA_CONFIG")]
    config: PathBuf,

    /// Metadata database path (overrides the configuration)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Address template operations
    Template {
        #[command(subcommand)]
        action: TemplateCommands,
    },
    /// Persistent metadata database operations
    Db {
        #[command(subcommand)]
        action: DbCommands,
    },
    /// Run the metadata pipeline against canned responses
    Process {
        /// JSON file mapping concrete addresses to read-resource-description payloads
        #[arg(short, long)]
        responses: PathBuf,
        /// Fetch recursively
        #[arg(long)]
        recursive: bool,
        /// Process the required resources of a configured screen
        #[arg(long)]
        screen: Option<String>,
        /// Select a tuple value (e.g. selected.profile=full)
        #[arg(long, value_parser = parse_selection)]
        select: Vec<(Tuple, String)>,
        /// Templates to process
        templates: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum TemplateCommands {
    /// Parse a template and show its tokens
    Parse {
        /// Template
        template: String,
    },
    /// Resolve a template to a concrete address
    Resolve {
        /// Template
        template: String,
        /// Select a tuple value (e.g. selected.host=primary)
        #[arg(long, value_parser = parse_selection)]
        select: Vec<(Tuple, String)>,
        /// Values replacing `*`, left to right
        #[arg(long)]
        wildcard: Vec<String>,
    },
    /// Turn a concrete address back into a template
    Unresolve {
        /// Concrete address
        address: String,
        /// Unresolve policy
        #[arg(long, value_enum, default_value_t = Policy::Wildcards)]
        policy: Policy,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    /// List stored keys
    List {
        /// Only this table (descriptions or security)
        #[arg(short, long)]
        table: Option<MetaTable>,
    },
    /// Show the documents stored for a key
    Get {
        /// Concrete address key
        key: String,
    },
    /// Remove every stored document
    Clear,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    Wildcards,
    Selections,
}

fn parse_selection(s: &str) -> Result<(Tuple, String), String> {
    let (tuple, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected tuple=value, got '{s}'"))?;
    Ok((tuple.parse()?, value.to_string()))
}

fn selection_context(config: &Config, select: Vec<(Tuple, String)>) -> Arc<SelectionContext> {
    let context = SelectionContext::new(config.environment.mode);
    for (tuple, value) in select {
        context.select(tuple, value);
    }
    Arc::new(context)
}

fn open_database(config: &Config, path: Option<PathBuf>) -> Result<RedbDatabase> {
    let path = path.unwrap_or_else(|| config.database.path.clone());
    RedbDatabase::open(&path).with_context(|| format!("Failed to open {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    match args.command {
        Commands::Template { action } => match action {
            TemplateCommands::Parse { template } => {
                let template = AddressTemplate::parse(&template)?;
                println!("Template: {template}");
                println!("Optional: {}", template.is_optional());
                println!("Tokens:   {}", template.size());
                for (i, token) in template.tokens().iter().enumerate() {
                    let kind = if token.has_key() { "key/value" } else { "bare" };
                    println!("  [{i}] {token} ({kind})");
                }
            }
            TemplateCommands::Resolve {
                template,
                select,
                wildcard,
            } => {
                let template = AddressTemplate::parse(&template)?;
                let context = selection_context(&config, select);
                println!("{}", template.resolve_with(context.as_ref(), &wildcard));
            }
            TemplateCommands::Unresolve { address, policy } => {
                let address: ResourceAddress = address.parse()?;
                let policy = match policy {
                    Policy::Wildcards => UnresolvePolicy::new(config.unresolve.rules.clone()),
                    Policy::Selections => UnresolvePolicy::selections(),
                };
                println!("{}", AddressTemplate::from_address(&address, &policy)?);
            }
        },

        Commands::Db { action } => {
            let database = open_database(&config, args.database)?;
            match action {
                DbCommands::List { table } => {
                    let tables = table.map_or_else(|| MetaTable::ALL.to_vec(), |t| vec![t]);
                    for table in tables {
                        let keys = database.list(table).await?;
                        println!("{table} ({} entries)", keys.len());
                        for key in keys {
                            println!("  {key}");
                        }
                    }
                }
                DbCommands::Get { key } => {
                    let mut found = false;
                    for table in MetaTable::ALL {
                        if let Some(document) = database.get(table, &key).await? {
                            found = true;
                            println!("{table}:");
                            println!("{}", serde_json::to_string_pretty(&document)?);
                        }
                    }
                    if !found {
                        return Err(anyhow!("No documents stored for {key}"));
                    }
                }
                DbCommands::Clear => {
                    for table in MetaTable::ALL {
                        let removed = database.clear(table).await?;
                        println!("Removed {removed} {table} documents");
                    }
                }
            }
        }

        Commands::Process {
            responses,
            recursive,
            screen,
            select,
            templates,
        } => {
            let dispatcher = Arc::new(FixtureDispatcher::load(&responses)?);
            let selection = selection_context(&config, select);
            let resolver = TemplateResolver::new(
                selection,
                Arc::new(UnresolvePolicy::new(config.unresolve.rules.clone())),
                config.environment.mode,
            );
            let registry = Arc::new(MetadataRegistry::new(resolver));
            let required = RequiredResources::from_config(&config.screens)?;

            let templates = templates
                .iter()
                .map(|t| AddressTemplate::parse(t))
                .collect::<Result<Vec<_>, _>>()?;
            let mut report = templates.clone();
            if let Some(id) = &screen {
                report.extend(required.resources(id).iter().cloned());
            }

            let mut builder = MetadataProcessor::builder(registry.clone(), dispatcher)
                .settings(config.processing.clone())
                .required_resources(required);
            let mut worker = None;
            if config.database.enabled || args.database.is_some() {
                let database: Arc<dyn MetaDatabase> =
                    Arc::new(open_database(&config, args.database)?);
                let (channel, _handle) =
                    WorkerChannel::spawn(database.clone(), config.worker.queue_capacity);
                builder = builder.database(database, channel.clone());
                worker = Some(channel);
            }
            let processor = builder.build();

            if let Some(id) = &screen {
                let outcome = processor.process_screen(id).await?;
                info!("Screen {} processed: {:?}", id, outcome);
            }
            if !templates.is_empty() {
                processor.process(templates, recursive).await?;
            }
            if let Some(worker) = worker {
                worker.flush().await?;
            }

            for template in &report {
                let presence = registry.check(template, false);
                println!("{template}: {presence}");
            }
        }
    }

    Ok(())
}
