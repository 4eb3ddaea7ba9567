use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod cli;

use cli::{Cli, Commands, ConfigArgs};
use nexus_bootstrap::config::{keys, loader};
use nexus_bootstrap::edition::FilePreferenceStore;
use nexus_bootstrap::host::{
    FeatureCatalog, HostContext, LocalModuleRegistry, LocalServiceRegistry,
};
use nexus_bootstrap::{cascade, Bootstrap, BootstrapOptions, Properties};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { config, catalog } => run_bootstrap(config, catalog).await,
        Commands::Resolve { config, json } => run_resolve(config, json),
    }
}

/// Build the bootstrap properties from files and command-line overrides.
///
/// Returns the properties together with the installation directory.
fn load_properties(config: &ConfigArgs) -> Result<(Properties, PathBuf)> {
    let base_dir = cli::resolve_base_dir(config.base_dir.as_deref())?;
    let data_dir = cli::resolve_data_dir(&base_dir, config.data_dir.as_deref());

    // An explicitly named default file must exist; the implicit one is optional.
    let default_file =
        cli::default_properties_file(&base_dir, config.default_properties.as_deref());
    let default_file =
        (config.default_properties.is_some() || default_file.exists()).then_some(default_file);
    let user_file = cli::user_properties_file(&data_dir, config.properties.as_deref());

    let mut overrides = vec![
        (keys::KARAF_BASE.to_string(), base_dir.to_string_lossy().to_string()),
        (keys::KARAF_DATA.to_string(), data_dir.to_string_lossy().to_string()),
    ];
    for raw in &config.overrides {
        overrides.push(loader::parse_override(raw)?);
    }

    let properties = loader::load_layered(default_file.as_deref(), Some(&user_file), &overrides)?;
    info!("Loaded {} bootstrap properties", properties.len());
    Ok((properties, base_dir))
}

async fn run_bootstrap(config: ConfigArgs, catalog: Option<String>) -> Result<()> {
    let (mut properties, base_dir) = load_properties(&config)?;
    let options = BootstrapOptions::from_properties(&properties);

    let data_dir = PathBuf::from(properties.require(keys::KARAF_DATA)?);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    let catalog_path = cli::feature_catalog_file(&base_dir, catalog.as_deref());
    let catalog = FeatureCatalog::load(&catalog_path)?;

    let services = Arc::new(LocalServiceRegistry::new());
    let registry = Arc::new(LocalModuleRegistry::new(
        catalog,
        &data_dir,
        services.clone(),
        options.service_scope.clone(),
    )?);
    let preferences = Arc::new(FilePreferenceStore::new()?);
    let context = Arc::new(HostContext::new());

    // The registry finishes initializing in the background
    let starter = registry.clone();
    tokio::spawn(async move {
        starter.start();
    });

    let mut bootstrap = Bootstrap::new(registry, services, preferences, context, options);

    let barrier = bootstrap.barrier();
    let shutdown = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown requested");
        barrier.close();
    });

    let state = bootstrap
        .run(&mut properties)
        .await
        .context("Failed to initialize")?;

    println!("✅ Bootstrap complete");
    println!("   Work dir: {}", state.work_dir.display());
    println!(
        "   Edition: {}",
        properties.get_or(keys::NEXUS_FULL_EDITION, properties.get_or(keys::NEXUS_EDITION, ""))
    );
    println!("   DB feature: {}", properties.get_or(keys::NEXUS_DB_FEATURE, ""));
    if let Some(install) = &state.install {
        if install.was_noop() {
            println!("   Features: already installed");
        } else {
            println!("   Features installed: {}", install.requested.join(", "));
        }
    }
    println!("   Listener: #{} ({})", state.listener.id, state.listener.provider);
    println!("   Filter: #{} ({})", state.filter.id, state.filter.provider);
    println!("Press Ctrl-C to stop.");

    shutdown.await.context("Shutdown task failed")?;
    bootstrap.shutdown();

    Ok(())
}

fn run_resolve(config: ConfigArgs, json: bool) -> Result<()> {
    let (mut properties, _) = load_properties(&config)?;
    cascade::apply(&mut properties);

    if json {
        let rendered =
            serde_json::to_string_pretty(&properties).context("Failed to serialize properties")?;
        println!("{}", rendered);
    } else {
        for (key, value) in properties.iter() {
            println!("{}={}", key, value);
        }
    }

    Ok(())
}
