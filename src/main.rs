use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use infractl::resource::{get_all_resource_keys, get_resource, Record};
use infractl::{format_client_error, ClientError, Config, InventoryClient, ResourceClient, ServiceConfig};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Inventory and lifecycle-management client
#[derive(Parser, Debug)]
#[command(name = "infractl", version, about, long_about = None)]
struct Args {
    /// Inventory service address (overrides config and environment)
    #[arg(long, global = true)]
    inventory: Option<String>,

    /// Inventory service API token
    #[arg(long, global = true)]
    inventory_token: Option<String>,

    /// Catalog service address (overrides config and environment)
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Catalog service API token
    #[arg(long, global = true)]
    catalog_token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "yaml", global = true)]
    output: OutputFormat,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered resource collections
    Resources,
    /// Get one record by id
    Get { resource: String, id: String },
    /// List records (first page)
    List {
        resource: String,
        /// Query filter as key=value, repeatable
        #[arg(long = "filter", value_parser = parse_key_value)]
        filters: Vec<(String, String)>,
    },
    /// Exact lookup on a unique field
    Find {
        resource: String,
        value: String,
        #[arg(long, default_value = "name")]
        field: String,
    },
    /// Every record matching a named filter
    Filter {
        resource: String,
        alias: String,
        value: String,
    },
    /// Create a record from a YAML or JSON file
    Create { resource: String, file: PathBuf },
    /// Update a record (the file must carry its id)
    Update { resource: String, file: PathBuf },
    /// Delete a record
    Delete { resource: String, id: String },
    /// Request a build; prints the operation handle or the dry-run preview
    Build {
        resource: String,
        id: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Request a teardown; prints the operation handle
    Teardown { resource: String, id: String },
    /// Descriptor templates on the catalog service
    #[command(subcommand)]
    Template(TemplateCommand),
    /// Stored configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum TemplateCommand {
    List,
    Get { name: String },
    Create { file: PathBuf },
    Update { file: PathBuf },
    Delete { name: String },
    /// Render a template from a request document (YAML or JSON)
    Render { name: String, file: PathBuf },
    /// Render a template and print the service output verbatim
    RenderRaw { name: String, file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective configuration with tokens masked
    Show,
    /// Store the given --inventory, --catalog, token and --timeout flags
    Set,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("infractl started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("infractl").join("infractl.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".infractl").join("infractl.log");
    }
    PathBuf::from("infractl.log")
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

/// Accept full registry keys or virtualization short names (`clusters`)
fn resolve_resource_key(name: &str) -> String {
    if get_resource(name).is_some() {
        return name.to_string();
    }
    let qualified = format!("virtualization.{}", name);
    if get_resource(&qualified).is_some() {
        qualified
    } else {
        name.to_string()
    }
}

fn read_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}

fn read_record(path: &Path) -> Result<Record> {
    match read_document(path)? {
        Value::Object(record) => Ok(record),
        _ => Err(anyhow::anyhow!("{:?} does not hold a single record", path)),
    }
}

fn print<T: Serialize>(format: OutputFormat, value: &T) -> Result<()> {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => serde_json::to_string_pretty(value)? + "\n",
    };
    print!("{}", rendered);
    Ok(())
}

/// Values given on the command line, as a config overlay
fn flag_overrides(args: &Args) -> Config {
    Config {
        inventory: ServiceConfig {
            address: args.inventory.clone(),
            token: args.inventory_token.clone(),
        },
        catalog: ServiceConfig {
            address: args.catalog.clone(),
            token: args.catalog_token.clone(),
        },
        timeout_secs: args.timeout,
    }
}

fn effective_config(overrides: &Config) -> Config {
    let mut config = Config::load();
    config.merge(overrides);
    config
}

fn resource_client(client: &InventoryClient, name: &str) -> Result<ResourceClient, ClientError> {
    client.resource(&resolve_resource_key(name))
}

async fn run_inventory(client: &InventoryClient, command: Command, format: OutputFormat) -> Result<()> {
    match command {
        Command::Get { resource, id } => {
            let record = resource_client(client, &resource)?.get(&id).await?;
            print(format, &record)?;
        }
        Command::List { resource, filters } => {
            let pairs: Vec<(&str, &str)> = filters
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            let page = resource_client(client, &resource)?.list_page(&pairs).await?;
            if page.next.is_some() {
                tracing::info!("{} of {} records returned; more pages available", page.results.len(), page.count);
            }
            print(format, &page.results)?;
        }
        Command::Find { resource, value, field } => {
            match resource_client(client, &resource)?.find_unique(&field, &value).await? {
                Some(record) => print(format, &record)?,
                None => eprintln!("No match on {}: {}", field, value),
            }
        }
        Command::Filter { resource, alias, value } => {
            let records = resource_client(client, &resource)?.filter_by(&alias, &value).await?;
            print(format, &records)?;
        }
        Command::Create { resource, file } => {
            let record = read_record(&file)?;
            let created = resource_client(client, &resource)?.create(record).await?;
            print(format, &created)?;
        }
        Command::Update { resource, file } => {
            let record = read_record(&file)?;
            let updated = resource_client(client, &resource)?.update(record).await?;
            print(format, &updated)?;
        }
        Command::Delete { resource, id } => {
            resource_client(client, &resource)?.delete(&id).await?;
        }
        Command::Build { resource, id, dry_run } => {
            let resource = resource_client(client, &resource)?;
            if dry_run {
                let preview = resource.build_dry_run(&id).await?;
                print(format, preview.document())?;
            } else {
                println!("{}", resource.build(&id).await?);
            }
        }
        Command::Teardown { resource, id } => {
            println!("{}", resource_client(client, &resource)?.teardown(&id).await?);
        }
        Command::Resources | Command::Template(_) | Command::Config(_) => {}
    }
    Ok(())
}

async fn run_templates(config: &Config, command: TemplateCommand, format: OutputFormat) -> Result<()> {
    let templates = config.catalog_client()?.descriptor_templates()?;
    match command {
        TemplateCommand::List => print(format, &templates.all().await?)?,
        TemplateCommand::Get { name } => print(format, &templates.get(&name).await?)?,
        TemplateCommand::Create { file } => templates.create(&read_document(&file)?).await?,
        TemplateCommand::Update { file } => templates.update(&read_document(&file)?).await?,
        TemplateCommand::Delete { name } => templates.delete(&name).await?,
        TemplateCommand::Render { name, file } => {
            let request = read_document(&file)?;
            print(format, &templates.render(&name, &request).await?)?;
        }
        TemplateCommand::RenderRaw { name, file } => {
            let request = read_document(&file)?;
            print!("{}", templates.render_raw(&name, &request).await?);
        }
    }
    Ok(())
}

fn run_config(command: ConfigCommand, overrides: &Config, format: OutputFormat) -> Result<()> {
    match command {
        ConfigCommand::Show => print(format, &effective_config(overrides).redacted()),
        ConfigCommand::Set => {
            let path = Config::config_path().context("No config directory on this platform")?;
            let mut stored = Config::load_from(&path);
            stored.merge(overrides);
            stored.save()?;
            println!("Saved {}", path.display());
            Ok(())
        }
    }
}

/// Print an error, using the client formatter when the cause is a `ClientError`
fn report(err: &anyhow::Error) {
    tracing::error!("{:#}", err);
    match err.downcast_ref::<ClientError>() {
        Some(client_err) => eprintln!("Error: {}", format_client_error(client_err)),
        None => eprintln!("Error: {err:#}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_guard = setup_logging(args.log_level);

    let overrides = flag_overrides(&args);
    let format = args.output;

    let result = match args.command {
        Command::Resources => {
            for key in get_all_resource_keys() {
                println!("{}", key);
            }
            Ok(())
        }
        Command::Config(command) => run_config(command, &overrides, format),
        Command::Template(command) => run_templates(&effective_config(&overrides), command, format).await,
        command => match effective_config(&overrides).inventory_client() {
            Ok(client) => run_inventory(&client, command, format).await,
            Err(err) => Err(err),
        },
    };

    if let Err(err) = result {
        report(&err);
        drop(log_guard);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_render_raw_is_a_template_subcommand() {
        let args = Args::try_parse_from(["infractl", "template", "render-raw", "tmpl::1.0", "req.yaml"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Template(TemplateCommand::RenderRaw { ref name, .. }) if name == "tmpl::1.0"
        ));
        assert!(Args::try_parse_from(["infractl", "template", "render", "t", "req.yaml", "--raw"]).is_err());
    }

    #[test]
    fn test_flags_become_config_overrides() {
        let args = Args::try_parse_from([
            "infractl",
            "--inventory",
            "http://sp",
            "--timeout",
            "5",
            "config",
            "set",
        ])
        .unwrap();
        assert!(matches!(args.command, Command::Config(ConfigCommand::Set)));

        let overrides = flag_overrides(&args);
        assert_eq!(overrides.inventory.address.as_deref(), Some("http://sp"));
        assert_eq!(overrides.inventory.token, None);
        assert_eq!(overrides.timeout_secs, Some(5));
    }

    #[test]
    fn test_output_failures_are_returned() {
        let unkeyable: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        assert!(print(OutputFormat::Json, &unkeyable).is_err());
    }

    #[test]
    fn test_short_resource_names_resolve() {
        assert_eq!(resolve_resource_key("clusters"), "virtualization.clusters");
        assert_eq!(
            resolve_resource_key("plugins.nfvi-automation.automation_contexts"),
            "plugins.nfvi-automation.automation_contexts"
        );
        assert_eq!(resolve_resource_key("nope"), "nope");
    }
}
