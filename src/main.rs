use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use miette::IntoDiagnostic;

use brownfield::config::AppConfig;
use brownfield::core::converter::{index_to_document_store, ConversionOptions};
use brownfield::core::logging;
use brownfield::core::preprocess::{DocumentSplitter, Preprocessor, SplitBy, SplitterConfig};
use brownfield::core::source::{Scheme, SearchBackend, SearchClient, SearchQuery, SourceIndex};
use brownfield::core::store::SurrealDocumentStore;

#[derive(Parser, Debug)]
#[command(
    name = "brownfield",
    version,
    about = "Migrate Elasticsearch/OpenSearch indexes into a document store"
)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/brownfield/config.toml)
    #[arg(long, global = true, env = "BROWNFIELD_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert the records of a source index into documents
    Convert(ConvertArgs),
    /// Count the records of a source index
    Count(CountArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Debug, Default)]
struct ConnectionArgs {
    /// Source backend: elasticsearch or opensearch
    #[arg(long)]
    backend: Option<SearchBackend>,
    /// Node host names or URLs
    #[arg(long = "host", value_delimiter = ',')]
    hosts: Vec<String>,
    /// One port for all hosts, or one per host
    #[arg(long = "port", value_delimiter = ',')]
    ports: Vec<u16>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long, env = "BROWNFIELD_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[arg(long)]
    api_key_id: Option<String>,
    #[arg(long, env = "BROWNFIELD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Token sent as `Authorization: Bearer` (managed/cloud clusters)
    #[arg(long, env = "BROWNFIELD_BEARER_TOKEN", hide_env_values = true)]
    bearer_token: Option<String>,
    #[arg(long)]
    scheme: Option<Scheme>,
    /// PEM bundle with root certificates
    #[arg(long)]
    ca_certs: Option<PathBuf>,
    #[arg(long)]
    verify_certs: Option<bool>,
    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    #[arg(long)]
    use_system_proxy: bool,
}

impl ConnectionArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }

        let conn = &mut config.connection;
        if !self.hosts.is_empty() {
            conn.hosts = Some(self.hosts.clone());
        }
        if !self.ports.is_empty() {
            conn.ports = Some(self.ports.clone());
        }
        override_with(&mut conn.username, &self.username);
        override_with(&mut conn.password, &self.password);
        override_with(&mut conn.api_key_id, &self.api_key_id);
        override_with(&mut conn.api_key, &self.api_key);
        override_with(&mut conn.bearer_token, &self.bearer_token);
        override_with(&mut conn.scheme, &self.scheme);
        override_with(&mut conn.ca_certs, &self.ca_certs);
        override_with(&mut conn.verify_certs, &self.verify_certs);
        override_with(&mut conn.timeout_secs, &self.timeout);
        if self.use_system_proxy {
            conn.use_system_proxy = Some(true);
        }
    }
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Source index to migrate
    #[arg(long)]
    index: String,
    /// Field whose text becomes the document content
    #[arg(long)]
    content_field: String,
    /// Field stored as `meta.name`
    #[arg(long)]
    name_field: Option<String>,
    /// Only keep these fields as metadata
    #[arg(long, value_delimiter = ',')]
    include: Option<Vec<String>>,
    /// Keep every field except these as metadata
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,
    /// Do not store source ids (later runs will duplicate documents)
    #[arg(long)]
    no_store_ids: bool,
    #[arg(long)]
    target_index: Option<String>,
    #[arg(long)]
    batch_size: Option<usize>,
    /// RocksDB directory of the target store
    #[arg(long)]
    store_path: Option<PathBuf>,
    /// Split documents by word, sentence or passage
    #[arg(long)]
    split_by: Option<SplitBy>,
    #[arg(long, requires = "split_by")]
    split_length: Option<usize>,
    #[arg(long, requires = "split_by")]
    split_overlap: Option<usize>,

    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(Args, Debug)]
struct CountArgs {
    #[arg(long)]
    index: String,

    #[command(flatten)]
    connection: ConnectionArgs,
}

fn override_with<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        *target = value.clone();
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).into_diagnostic()?;
    match &cli.command {
        Command::Convert(args) => {
            args.connection.apply(&mut config);
            override_with(&mut config.target.path, &args.store_path);
            if let Some(batch_size) = args.batch_size {
                config.conversion.batch_size = batch_size;
            }
            if args.no_store_ids {
                config.conversion.store_original_ids = false;
            }
        }
        Command::Count(args) => args.connection.apply(&mut config),
        Command::Config => {}
    }
    match cli.verbose {
        0 => {}
        1 => config.logging.level = "debug".to_string(),
        _ => config.logging.level = "trace".to_string(),
    }

    let _log_guard = logging::init(&config.logging);
    tracing::debug!(version = brownfield::VERSION, "brownfield starting");

    match cli.command {
        Command::Convert(args) => convert(args, &config).await,
        Command::Count(args) => count(args, &config, cli.verbose > 0).await,
        Command::Config => {
            print!("{}", config.to_toml().into_diagnostic()?);
            Ok(())
        }
    }
}

async fn convert(args: ConvertArgs, config: &AppConfig) -> miette::Result<()> {
    let options = ConversionOptions {
        source_index: args.index,
        content_field: args.content_field,
        name_field: args.name_field,
        included_metadata_fields: args.include,
        excluded_metadata_fields: args.exclude,
        store_original_ids: config.conversion.store_original_ids,
        target_index: Some(args.target_index.unwrap_or_else(|| config.target.index.clone())),
        batch_size: config.conversion.batch_size,
    };
    options.validate()?;

    let preprocessor: Option<Box<dyn Preprocessor>> = match args.split_by {
        Some(split_by) => {
            let defaults = SplitterConfig::default();
            let splitter = DocumentSplitter::new(SplitterConfig {
                split_by,
                split_length: args.split_length.unwrap_or(defaults.split_length),
                split_overlap: args.split_overlap.unwrap_or(defaults.split_overlap),
                ..defaults
            })
            .into_diagnostic()?;
            Some(Box::new(splitter) as Box<dyn Preprocessor>)
        }
        None => None,
    };

    let store_path = config.target.store_path();
    let store = SurrealDocumentStore::open(&store_path, config.target.store_config())
        .await
        .into_diagnostic()?;

    let store_original_ids = options.store_original_ids;
    let (_store, report) = index_to_document_store(
        store,
        config.backend,
        &config.connection_config(),
        options,
        preprocessor,
    )
    .await?;

    logging::print_panel("Conversion complete", &report.summary());
    if report.documents_written == 0 {
        logging::print_info("Nothing new to migrate");
    } else {
        logging::print_success(&format!(
            "Wrote {} documents to {}",
            report.documents_written,
            store_path.display()
        ));
    }
    if !store_original_ids {
        logging::print_warning("Source ids were not stored: running again will duplicate documents");
    }

    Ok(())
}

async fn count(args: CountArgs, config: &AppConfig, verbose: bool) -> miette::Result<()> {
    let client = SearchClient::connect(config.backend, &config.connection_config()).into_diagnostic()?;

    if verbose {
        let info = client.ping().await.into_diagnostic()?;
        logging::print_info(&format!(
            "{} cluster '{}' version {}",
            info.distribution.as_deref().unwrap_or(config.backend.label()),
            info.cluster_name,
            info.version
        ));
    }

    let total = client
        .count(&args.index, &SearchQuery::match_all())
        .await
        .into_diagnostic()?;
    println!("{}", total);
    Ok(())
}
