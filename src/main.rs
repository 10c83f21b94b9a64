//! fwspec - firewall specification resolver
//!
//! Command-line front end for checking the port, address and interface
//! fields of firewall zone settings before they are applied.
//!
//! # Usage
//!
//! ```bash
//! fwspec port http-alt-9000            # Resolve a port or range
//! fwspec service 22 --protocol tcp     # Canonical name for a port
//! fwspec check-ip 192.168.1.1          # Validate an IPv4 literal
//! fwspec check-interface eth0          # Validate an interface name
//! fwspec zone public.json              # Validate a whole zone document
//! fwspec status                        # Is the firewall daemon running?
//! fwspec interfaces                    # List system interfaces
//! fwspec init-config                   # Write the default configuration
//! ```

use clap::{Parser, Subcommand};
use fwspec::config::{self, AppConfig};
use fwspec::core::error::translate;
use fwspec::core::ports::{self, PortSpec};
use fwspec::core::zone::{self, ZoneSettings};
use fwspec::{utils, validators};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fwspec")]
#[command(about = "Resolve and validate firewall port, address and interface specifications", long_about = None)]
struct Cli {
    /// Configuration file (default: <data dir>/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Service database to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    services: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a port, service name, or port range
    Port {
        /// e.g. 22, ssh, 8000-8080, http-alt-9000
        spec: String,
    },
    /// Look up the service name registered for a port
    Service {
        port: String,
        #[arg(short, long, default_value = "tcp")]
        protocol: String,
    },
    /// Check an IPv4 address literal
    CheckIp { address: String },
    /// Check a network interface name
    CheckInterface { name: String },
    /// Validate a zone settings JSON document
    Zone { file: PathBuf },
    /// Report whether the firewall daemon is running
    Status,
    /// List system network interfaces and whether their names are accepted
    Interfaces,
    /// Write the default configuration file
    InitConfig,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "fwspec=debug" } else { "fwspec=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to create Tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(handle_cli(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            let translation = translate(&e);
            eprintln!("Error: {}", translation.user_message);
            for suggestion in translation.suggestions {
                eprintln!("  - {suggestion}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Runs one command; `Ok(false)` means the input was checked and rejected.
async fn handle_cli(cli: Cli) -> fwspec::Result<bool> {
    // init-config must not require the file it is about to create
    let mut config = if matches!(cli.command, Commands::InitConfig) {
        AppConfig::default()
    } else {
        config::load_config(cli.config.as_deref()).await?
    };
    if let Some(services) = cli.services {
        config.services_file = services;
    }

    match cli.command {
        Commands::Port { spec } => {
            let services = config.services();
            let spec = PortSpec::from(spec);
            match ports::resolve_port_range(&services, &spec).into_result("port", &spec) {
                Ok(range) => {
                    println!("{range}");
                    if range.is_single()
                        && let Some(hint) = validators::check_well_known_port(range.start())
                    {
                        println!("  {hint}");
                    }
                    Ok(true)
                }
                Err(err) => {
                    let translation = translate(&err);
                    println!("✗ {}", translation.user_message);
                    for suggestion in translation.suggestions {
                        println!("  - {suggestion}");
                    }
                    Ok(false)
                }
            }
        }
        Commands::Service { port, protocol } => {
            let services = config.services();
            match ports::service_name(&services, &PortSpec::from(port.clone()), &protocol) {
                Some(name) => {
                    println!("{name}");
                    Ok(true)
                }
                None => {
                    println!("✗ No service registered for {port}/{protocol}");
                    Ok(false)
                }
            }
        }
        Commands::CheckIp { address } => Ok(report_check(
            validators::check_ip(&address),
            "address",
            &address,
        )),
        Commands::CheckInterface { name } => Ok(report_check(
            config.interface_limits.check(&name),
            "interface",
            &name,
        )),
        Commands::Zone { file } => {
            let json = tokio::fs::read_to_string(&file).await?;
            let settings: ZoneSettings = serde_json::from_str(&json)?;
            let services = config.services();
            let report = zone::validate_zone(&settings, &services, &config.interface_limits);

            for port in &report.ports {
                println!("  {}/{}", port.range, port.protocol);
            }
            for warning in &report.warnings {
                println!("⚠ {warning}");
            }
            for translation in report.translations() {
                println!("✗ {}", translation.user_message);
                for suggestion in translation.suggestions {
                    println!("    - {suggestion}");
                }
            }

            if report.is_valid() {
                println!("✓ Zone '{}' is valid", settings.name);
            } else {
                println!(
                    "✗ Zone '{}' has {} error(s)",
                    settings.name,
                    report.errors.len()
                );
            }
            Ok(report.is_valid())
        }
        Commands::Status => {
            let probe = config.liveness_probe();
            let liveness = probe.probe_async().await;
            println!("{}: {}", probe.program, liveness.describe());
            Ok(liveness.is_running())
        }
        Commands::Interfaces => {
            for name in utils::list_interfaces() {
                let mark = if config.interface_limits.check(&name) {
                    "✓"
                } else {
                    "✗"
                };
                println!("{mark} {name}");
            }
            Ok(true)
        }
        Commands::InitConfig => {
            let path = config::save_config(&config, cli.config.as_deref()).await?;
            println!("✓ Wrote default configuration to {}", path.display());
            Ok(true)
        }
    }
}

fn report_check(valid: bool, field: &str, value: &str) -> bool {
    if valid {
        println!("✓ {value}");
    } else {
        let err = fwspec::Error::InvalidFormat {
            field: field.to_string(),
            value: value.to_string(),
        };
        let translation = translate(&err);
        println!("✗ {}", translation.user_message);
        for suggestion in translation.suggestions {
            println!("  - {suggestion}");
        }
    }
    valid
}
