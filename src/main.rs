//! Unisphere REST command line
//!
//! Issues resource calls against a management server using either
//! addressing convention and prints the JSON result.
//!
//! ```text
//! unisphere-rest --config array.yaml get --array 000197800123 \
//!     --category sloprovisioning --resource-type storagegroup
//! unisphere-rest modify --category sloprovisioning --resource-level symmetrix \
//!     --resource-level-id 000197800123 --resource-type storagegroup \
//!     --resource-type-id SG1 --payload @expand.json --async
//! ```

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use unisphere_rest::{
    ArrayClient, ClientConfig, Error, ErrorCategory, ExecutionMode, QueryParams, ResourceArgs,
    Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Unisphere REST client - storage array management from the command line
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(long, env = "UNISPHERE_CONFIG")]
    config: Option<PathBuf>,

    /// Management server address
    #[arg(long, env = "UNISPHERE_SERVER_IP")]
    server_ip: Option<String>,

    /// Management server port
    #[arg(long, env = "UNISPHERE_PORT")]
    port: Option<u16>,

    /// Username
    #[arg(long, env = "UNISPHERE_USERNAME")]
    username: Option<String>,

    /// Password
    #[arg(long, env = "UNISPHERE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Default array serial number
    #[arg(long, env = "UNISPHERE_ARRAY")]
    default_array: Option<String>,

    /// Default API version segment
    #[arg(long, env = "UNISPHERE_API_VERSION")]
    api_version: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, env = "UNISPHERE_INSECURE")]
    insecure: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Get a resource or collection
    Get {
        #[command(flatten)]
        address: AddressArgs,

        /// Query parameter as key=value; may repeat
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// Create a resource
    Create {
        #[command(flatten)]
        address: AddressArgs,

        #[command(flatten)]
        body: BodyArgs,

        /// Run as an array job and wait for it
        #[arg(long = "async")]
        asynchronous: bool,
    },

    /// Modify a resource
    Modify {
        #[command(flatten)]
        address: AddressArgs,

        #[command(flatten)]
        body: BodyArgs,

        /// Run as an array job and wait for it
        #[arg(long = "async")]
        asynchronous: bool,
    },

    /// Delete a resource
    Delete {
        #[command(flatten)]
        address: AddressArgs,

        #[command(flatten)]
        body: BodyArgs,
    },

    /// Show a job, optionally waiting for it to finish
    Job {
        job_id: String,

        #[arg(long)]
        wait: bool,
    },

    /// List jobs on the default array, or across all arrays
    Jobs {
        #[arg(long)]
        all: bool,

        /// Filter as key=value; may repeat
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// List alerts on the default array, or across all arrays
    Alerts {
        #[arg(long)]
        all: bool,

        /// Filter as key=value; may repeat
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// Show the management server version
    Version,

    /// List arrays visible to the server
    Arrays {
        /// Only arrays that support provisioning
        #[arg(long)]
        v3: bool,
    },
}

/// Resource address in either convention
#[derive(clap::Args, Debug, Clone, Default)]
struct AddressArgs {
    /// Array serial number (legacy addressing)
    #[arg(long)]
    array: Option<String>,

    #[arg(long)]
    category: String,

    #[arg(long)]
    resource_type: Option<String>,

    /// Resource name (legacy addressing)
    #[arg(long)]
    resource_name: Option<String>,

    #[arg(long)]
    resource_level: Option<String>,

    #[arg(long)]
    resource_level_id: Option<String>,

    #[arg(long)]
    resource_type_id: Option<String>,

    #[arg(long)]
    resource: Option<String>,

    #[arg(long)]
    resource_id: Option<String>,

    #[arg(long)]
    object_type: Option<String>,

    #[arg(long)]
    object_type_id: Option<String>,

    /// Explicit API version for this path
    #[arg(long)]
    resource_version: Option<String>,

    /// Address without a version segment
    #[arg(long)]
    no_version: bool,
}

impl From<AddressArgs> for ResourceArgs {
    fn from(args: AddressArgs) -> Self {
        ResourceArgs {
            array_id: args.array,
            category: Some(args.category),
            resource_type: args.resource_type,
            resource_name: args.resource_name,
            resource_level: args.resource_level,
            resource_level_id: args.resource_level_id,
            resource_type_id: args.resource_type_id,
            resource: args.resource,
            resource_id: args.resource_id,
            object_type: args.object_type,
            object_type_id: args.object_type_id,
            version: args.resource_version,
            no_version: args.no_version,
        }
    }
}

#[derive(clap::Args, Debug, Clone, Default)]
struct BodyArgs {
    /// JSON request body, or @path to read it from a file
    #[arg(long)]
    payload: Option<String>,
}

impl BodyArgs {
    fn parse(&self) -> Result<Option<Value>> {
        let Some(text) = self.payload.as_deref() else {
            return Ok(None);
        };
        let text = match text.strip_prefix('@') {
            Some(path) => std::fs::read_to_string(path)?,
            None => text.to_string(),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))
}

fn query_params(pairs: Vec<(String, String)>) -> Option<QueryParams> {
    let params: QueryParams = pairs.into_iter().collect();
    (!params.is_empty()).then_some(params)
}

fn execution_mode(asynchronous: bool) -> ExecutionMode {
    if asynchronous {
        ExecutionMode::Asynchronous
    } else {
        ExecutionMode::Synchronous
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(&args);

    match run_cli(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run_cli(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    info!(
        "Connecting to {} as {} (version {})",
        config.base_url(),
        config.username,
        unisphere_rest::VERSION
    );
    let client = ArrayClient::connect(config)?;

    let result = run(&client, args.command).await;
    if let Err(e) = client.close_session().await {
        debug!("Error closing session: {}", e);
    }
    print_json(&result?)
}

fn exit_code(err: &Error) -> u8 {
    match err.category() {
        ErrorCategory::Input => 2,
        ErrorCategory::NotFound => 3,
        ErrorCategory::Array => 4,
        ErrorCategory::Job => 5,
        ErrorCategory::Transport => 6,
        ErrorCategory::Local => 1,
    }
}

async fn run(client: &ArrayClient, command: Command) -> Result<Value> {
    match command {
        Command::Get { address, params } => {
            let params = query_params(params);
            let body = client
                .get_resource(&address.into(), params.as_ref())
                .await?;
            Ok(body.unwrap_or(Value::Null))
        }
        Command::Create {
            address,
            body,
            asynchronous,
        } => {
            let body = client
                .create_resource(&address.into(), body.parse()?, execution_mode(asynchronous))
                .await?;
            Ok(body.unwrap_or(Value::Null))
        }
        Command::Modify {
            address,
            body,
            asynchronous,
        } => {
            let body = client
                .modify_resource(&address.into(), body.parse()?, execution_mode(asynchronous))
                .await?;
            Ok(body.unwrap_or(Value::Null))
        }
        Command::Delete { address, body } => {
            client.delete_resource(&address.into(), body.parse()?).await?;
            Ok(Value::Null)
        }
        Command::Job { job_id, wait } => {
            let job = if wait {
                client
                    .wait_for_job_complete(&job_id, client.config().poll_settings())
                    .await?
            } else {
                client.get_job_by_id(&job_id).await?
            };
            Ok(serde_json::to_value(job)?)
        }
        Command::Jobs { all, params } => {
            let filters = query_params(params);
            if all {
                Ok(serde_json::to_value(client.get_all_jobs(filters.as_ref()).await?)?)
            } else {
                let body = client.get_array_jobs(None, filters.as_ref()).await?;
                Ok(body.unwrap_or(Value::Null))
            }
        }
        Command::Alerts { all, params } => {
            let filters = query_params(params);
            if all {
                Ok(serde_json::to_value(client.get_all_alerts(filters.as_ref()).await?)?)
            } else {
                let body = client.get_array_alerts(None, filters.as_ref()).await?;
                Ok(body.unwrap_or(Value::Null))
            }
        }
        Command::Version => {
            let version = client.get_uni_version().await?;
            Ok(serde_json::json!({
                "version": version.version,
                "major_version": version.major_version,
            }))
        }
        Command::Arrays { v3 } => {
            let arrays = if v3 {
                client.get_v3_or_newer_array_list().await?
            } else {
                client.get_array_list(None).await?
            };
            Ok(serde_json::to_value(arrays)?)
        }
    }
}

fn load_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };

    if let Some(ip) = &args.server_ip {
        config.server_ip = ip.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(username) = &args.username {
        config.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.password = password.clone();
    }
    if let Some(array) = &args.default_array {
        config.array_id = Some(array.clone());
    }
    if let Some(version) = &args.api_version {
        config.api_version = version.clone();
    }
    if args.insecure {
        config.verify_tls = false;
    }

    config.validate()?;
    Ok(config)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=warn", "rustls=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // Logs go to stderr so stdout stays valid JSON
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
