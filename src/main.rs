use azure_resource_lifecycle::azure::build_backend;
use azure_resource_lifecycle::logging::{init_logging, LOG_CONFIG_FILE};
use azure_resource_lifecycle::models::ResourceSpec;
use azure_resource_lifecycle::output::print_report;
use azure_resource_lifecycle::processing::{Lifecycle, SystemClock};
use azure_resource_lifecycle::LifecycleConfig;
use clap::{Parser, ValueEnum};
use std::error::Error;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SampleKind {
    /// Virtual network with one /16 address space
    Vnet,
    /// General purpose v2 storage account
    Storage,
}

/// Create a resource group and a sample resource in it, then clean up.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Resource group to create
    #[arg(long, env = "SAMPLE_GROUP", default_value = "sample-rg")]
    group: String,
    /// Region, defaults to AZURE_LOCATION
    #[arg(long)]
    location: Option<String>,
    #[arg(long, value_enum, default_value_t = SampleKind::Vnet)]
    kind: SampleKind,
    /// Name of the resource to create
    #[arg(long, default_value = "samplevnet01")]
    name: String,
    /// Address prefix of the sample virtual network
    #[arg(long, default_value = "10.1.0.0/16")]
    address_prefix: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    init_logging(LOG_CONFIG_FILE)?;
    let args = Args::parse();
    log::info!("#Start main()");

    let config = LifecycleConfig::from_env().inspect_err(|e| log::error!("{e}"))?;
    let location = args.location.unwrap_or_else(|| config.location.clone());
    let spec = match args.kind {
        SampleKind::Vnet => {
            ResourceSpec::virtual_network(&args.name, &location, vec![args.address_prefix])
        }
        SampleKind::Storage => ResourceSpec::storage_account(&args.name, &location, "Standard_LRS"),
    };

    let backend = build_backend(&config).inspect_err(|e| log::error!("{e}"))?;
    let lifecycle = Lifecycle::new(
        backend,
        Arc::new(SystemClock::new()),
        config.lifecycle_options(),
    );

    let report = lifecycle
        .run(&args.group, &location, &spec)
        .await
        .inspect_err(|e| log::error!("{e}"))?;
    print_report(&report);

    Ok(())
}
