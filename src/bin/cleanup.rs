use azure_resource_lifecycle::azure::build_backend;
use azure_resource_lifecycle::logging::{init_logging, LOG_CONFIG_FILE};
use azure_resource_lifecycle::processing::{select_groups, sweep, Lifecycle, SystemClock};
use azure_resource_lifecycle::LifecycleConfig;
use clap::Parser;
use colored::Colorize;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Delete leftover sample resource groups.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Only groups whose name starts with this prefix are deleted
    #[arg(long, env = "SAMPLE_GROUP_PREFIX", default_value = "sample-")]
    prefix: String,
    /// Do not ask for confirmation
    #[arg(short, long)]
    quiet: bool,
}

fn confirm(count: usize) -> io::Result<bool> {
    print!("Delete {count} resource group(s)? [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    init_logging(LOG_CONFIG_FILE)?;
    let args = Args::parse();
    log::info!("#Start cleanup prefix='{}'", args.prefix);

    let config = LifecycleConfig::from_env().inspect_err(|e| log::error!("{e}"))?;
    let backend = build_backend(&config).inspect_err(|e| log::error!("{e}"))?;
    let lifecycle = Lifecycle::new(
        backend,
        Arc::new(SystemClock::new()),
        config.lifecycle_options(),
    );

    let groups = lifecycle
        .list_resource_groups()
        .await
        .inspect_err(|e| log::error!("{e}"))?;
    let selected = select_groups(&groups, &args.prefix);
    if selected.is_empty() {
        log::info!("no resource group starts with '{}'", args.prefix);
        return Ok(());
    }
    for group in &selected {
        println!("{} {}", "delete".on_red(), group.id);
    }
    if !args.quiet && !confirm(selected.len())? {
        log::warn!("aborted by user");
        return Ok(());
    }

    let summary = sweep(&lifecycle, &selected).await;
    if !summary.failed.is_empty() {
        return Err(format!("{} resource group(s) could not be deleted", summary.failed.len()).into());
    }
    Ok(())
}
