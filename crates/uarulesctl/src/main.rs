// # uarulesctl - User Agent Blocking Rule host
//
// Thin integration layer: reads configuration from flags or the environment,
// wires a rule API client and a state store into a `LifecycleEngine`, runs
// one action and prints the result. All lifecycle logic lives in uarules-core.
//
// ## Usage
//
// ```text
// uarulesctl apply   <address>
// uarulesctl refresh <address>
// uarulesctl destroy <address>
// uarulesctl import  <address> <zone_id>/<rule_id>
// uarulesctl show    <address>
// uarulesctl state
// uarulesctl list    <zone_id>
// uarulesctl schema
// ```
//
// ## Configuration
//
// Every option has a flag and an environment variable:
//
// - `--provider` / `UARULES_PROVIDER_TYPE`: Rule API provider (cloudflare, memory)
// - `--api-token` / `UARULES_API_TOKEN`: Cloudflare API token
// - `--api-base-url` / `UARULES_API_BASE_URL`: Cloudflare API base URL override
// - `--state-path` / `UARULES_STATE_PATH`: Path to the state file (default `./uarules.state.json`)
// - `--resource-file` / `UARULES_RESOURCE_FILE`: JSON object with the rule's fields (for `apply`)
// - `--log-level` / `UARULES_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export UARULES_API_TOKEN=your_token
// export UARULES_RESOURCE_FILE=./curl-rule.json
//
// uarulesctl apply cloudflare_user_agent_blocking_rule.curl
// ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use uarules_core::config::{DEFAULT_STATE_PATH, ProviderConfig, StateStoreConfig};
use uarules_core::{
    ApiRegistry, Diagnostic, LifecycleEngine, Outcome, ResourceData, UarulesConfig,
    UserAgentBlockingRule, UserAgentBlockingRuleResource, UserAgentRuleApi,
};

/// Exit codes for different termination scenarios
///
/// - 0: Action succeeded
/// - 1: Configuration or usage error
/// - 2: Runtime error or error diagnostics
#[derive(Debug, Clone, Copy)]
enum CtlExitCode {
    /// Action succeeded
    Success = 0,
    /// Configuration error or bad arguments
    ConfigError = 1,
    /// Runtime error (remote or state failure)
    RuntimeError = 2,
}

impl From<CtlExitCode> for ExitCode {
    fn from(code: CtlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// uarulesctl -- manage Cloudflare User Agent Blocking Rules
#[derive(Debug, Parser)]
#[command(
    name = "uarulesctl",
    version,
    about = "Create, refresh, import and destroy User Agent Blocking Rules",
    subcommand_required = true,
    arg_required_else_help = true
)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

/// Action requested on the command line
#[derive(Debug, Subcommand)]
enum Command {
    /// Create or update the rule at an address from the resource file
    Apply {
        /// Resource address, e.g. cloudflare_user_agent_blocking_rule.curl
        address: String,
    },
    /// Re-read the rule at an address from the remote service
    Refresh { address: String },
    /// Delete the rule at an address and forget it
    Destroy { address: String },
    /// Adopt an existing rule under an address
    Import {
        address: String,
        /// Rule to adopt, as <zone_id>/<rule_id>
        import_id: String,
    },
    /// Print the stored state for an address
    Show { address: String },
    /// List managed addresses
    State,
    /// Print every rule in a zone
    List { zone_id: String },
    /// Print the resource schema
    Schema,
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Application configuration
#[derive(Debug, Args)]
struct Config {
    /// Rule API provider (cloudflare, memory)
    #[arg(
        long = "provider",
        env = "UARULES_PROVIDER_TYPE",
        default_value = "cloudflare",
        global = true
    )]
    provider_type: String,

    /// Cloudflare API token
    #[arg(long, env = "UARULES_API_TOKEN", hide_env_values = true, global = true)]
    api_token: Option<String>,

    /// Cloudflare API base URL override
    #[arg(long, env = "UARULES_API_BASE_URL", global = true)]
    api_base_url: Option<String>,

    /// Path to the state file
    #[arg(
        long,
        env = "UARULES_STATE_PATH",
        default_value = DEFAULT_STATE_PATH,
        global = true
    )]
    state_path: String,

    /// JSON object with the rule's fields (for apply)
    #[arg(long, env = "UARULES_RESOURCE_FILE", global = true)]
    resource_file: Option<String>,

    /// Log level
    #[arg(
        long,
        env = "UARULES_LOG_LEVEL",
        default_value = "info",
        ignore_case = true,
        global = true
    )]
    log_level: LogLevel,
}

impl Config {
    fn api_token(&self) -> &str {
        self.api_token.as_deref().unwrap_or_default()
    }

    /// Core configuration for the chosen provider and state file
    fn core_config(&self) -> UarulesConfig {
        let provider = match self.provider_type.as_str() {
            "cloudflare" => ProviderConfig::Cloudflare {
                api_token: self.api_token().to_string(),
                base_url: self.api_base_url.clone().filter(|url| !url.is_empty()),
            },
            "memory" => ProviderConfig::Memory,
            other => ProviderConfig::Custom {
                factory: other.to_string(),
                config: Value::Object(Map::new()),
            },
        };

        UarulesConfig {
            provider,
            state_store: StateStoreConfig::File {
                path: self.state_path.clone(),
            },
        }
    }

    /// Validate the configuration
    fn validate(&self, registry: &ApiRegistry) -> Result<()> {
        if !registry.has(&self.provider_type) {
            anyhow::bail!(
                "UARULES_PROVIDER_TYPE '{}' is not supported. Supported providers: {}",
                self.provider_type,
                registry.list().join(", ")
            );
        }

        if self.provider_type == "cloudflare" && self.api_token().is_empty() {
            anyhow::bail!(
                "UARULES_API_TOKEN is required. \
                Set it via: export UARULES_API_TOKEN=your_token"
            );
        }

        if let Some(parent) = std::path::Path::new(&self.state_path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            anyhow::bail!(
                "UARULES_STATE_PATH parent directory does not exist: {}",
                parent.display()
            );
        }

        self.core_config().validate()?;
        Ok(())
    }

    /// Read the rule's fields for `apply`
    fn load_resource(&self) -> Result<Map<String, Value>> {
        let path = self
            .resource_file
            .as_deref()
            .context("UARULES_RESOURCE_FILE is required for apply")?;
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read resource file {}", path))?;
        match serde_json::from_str(&raw)
            .with_context(|| format!("resource file {} is not valid JSON", path))?
        {
            Value::Object(fields) => Ok(fields),
            _ => anyhow::bail!("resource file {} must contain a JSON object", path),
        }
    }
}

fn registry() -> ApiRegistry {
    let registry = ApiRegistry::with_builtins();

    #[cfg(feature = "cloudflare")]
    uarules_provider_cloudflare::register(&registry);

    registry
}

fn main() -> ExitCode {
    let Cli { config, command } = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                CtlExitCode::ConfigError.into()
            } else {
                CtlExitCode::Success.into()
            };
        }
    };

    let registry = registry();

    if !matches!(command, Command::Schema)
        && let Err(e) = config.validate(&registry)
    {
        eprintln!("Configuration validation error: {}", e);
        return CtlExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(config.log_level))
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CtlExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CtlExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(command, config, registry).await {
            Ok(code) => code,
            Err(e) => {
                error!("{}", e);
                CtlExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run one action
async fn run(command: Command, config: Config, registry: ApiRegistry) -> Result<CtlExitCode> {
    if matches!(command, Command::Schema) {
        let resource = UserAgentBlockingRuleResource::new(Arc::new(
            uarules_core::MemoryRuleApi::new(),
        ));
        print_json(&uarules_core::Resource::schema(&resource))?;
        return Ok(CtlExitCode::Success);
    }

    let core = config.core_config();
    let api: Arc<dyn UserAgentRuleApi> = Arc::from(registry.create_api(&core.provider)?);
    info!("Using {} rule API", api.provider_name());
    if matches!(core.provider, ProviderConfig::Memory) {
        warn!("memory provider selected: remote rules do not outlive this process");
    }

    if let Command::List { zone_id } = &command {
        return list(api.as_ref(), zone_id).await;
    }

    let state_store = uarules_core::state::open(&core.state_store).await?;
    let resource = UserAgentBlockingRuleResource::new(api);
    let engine = LifecycleEngine::new(Box::new(resource), state_store);

    let outcome = match command {
        Command::Apply { address } => engine.apply(&address, config.load_resource()?).await?,
        Command::Refresh { address } => engine.refresh(&address).await?,
        Command::Destroy { address } => engine.destroy(&address).await?,
        Command::Import { address, import_id } => engine.import(&address, &import_id).await?,
        Command::Show { address } => {
            return match engine.show(&address).await? {
                Some(record) => {
                    print_json(&record)?;
                    Ok(CtlExitCode::Success)
                }
                None => {
                    eprintln!("No state for {}", address);
                    Ok(CtlExitCode::RuntimeError)
                }
            };
        }
        Command::State => {
            for address in engine.addresses().await? {
                println!("{}", address);
            }
            return Ok(CtlExitCode::Success);
        }
        Command::List { .. } | Command::Schema => unreachable!("handled above"),
    };

    report(&outcome)
}

/// Print every rule in a zone in the resource's field layout
async fn list(api: &dyn UserAgentRuleApi, zone_id: &str) -> Result<CtlExitCode> {
    let mut page = 1;
    let mut rules = Vec::new();
    loop {
        let current = api.list_rules(zone_id, page).await?;
        for remote in &current.rules {
            let rule = UserAgentBlockingRule {
                zone_id: zone_id.to_string(),
                id: remote.id.clone(),
                description: remote.description.clone(),
                paused: remote.paused,
                mode: remote.mode.clone(),
                configuration: remote.configuration.clone(),
            };
            let mut data = ResourceData::new();
            rule.apply_to(&mut data);
            rules.push(data);
        }
        if !current.has_next() || current.rules.is_empty() {
            break;
        }
        page += 1;
    }

    info!("{} rule(s) in zone {}", rules.len(), zone_id);
    print_json(&rules)?;
    Ok(CtlExitCode::Success)
}

fn report(outcome: &Outcome) -> Result<CtlExitCode> {
    for diagnostic in &outcome.diagnostics {
        print_diagnostic(diagnostic);
    }

    if !outcome.is_success() {
        error!("{} failed", outcome.action);
        return Ok(CtlExitCode::RuntimeError);
    }

    info!("{} complete", outcome.action);
    match &outcome.data {
        Some(data) => print_json(data)?,
        None => println!("null"),
    }
    Ok(CtlExitCode::Success)
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    eprintln!("{}", diagnostic);
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
