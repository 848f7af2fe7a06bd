use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use kong_provision::cli::{Cli, usage_hint};
use kong_provision::output::{print_error, print_report};
use kong_provision::{FileStore, KongClient, config, observability, reconcile};

#[tokio::main]
async fn main() {
    observability::init_tracing("warn");

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let Some(path) = config::resolve_config_path(cli.config.as_deref()) else {
        println!("{}", usage_hint());
        anyhow::bail!("No provisioning document given");
    };

    let cfg = config::load_config(&path)?.with_gateway_url(cli.kong);
    let store = FileStore::new(cli.store.unwrap_or_else(FileStore::default_path));
    let client = KongClient::new(&cfg.kong);

    println!("{}: {}", "Config".cyan(), path.display());
    println!("{}: {}", "Kong".cyan(), client.base_url());
    println!("{}: {}", "Store".cyan(), store.path().display());

    let report = reconcile(&client, &store, &cfg)
        .await
        .with_context(|| format!("Provisioning {} failed", client.base_url()))?;
    print_report(&report);
    Ok(())
}
