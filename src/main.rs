use clap::Parser;
use quake_map::utils::error::ErrorSeverity;
use quake_map::utils::{logger, validation::Validate};
use quake_map::{
    legend_labels, CliConfig, LocalStorage, MapConfig, MapEngine, QuakeMapPipeline, DEPTH_LEGEND,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting quake-map");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.load_map_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no feeds will be fetched");
        print_dry_run(&config)?;
        return Ok(());
    }

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output.path.clone());
    let pipeline = QuakeMapPipeline::new(storage, config);
    let engine = MapEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Map generated successfully!");
            println!("✅ Map generated successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Map generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn print_dry_run(config: &MapConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Earthquake feed : {}", config.feeds.earthquakes);
    println!("Plates feed     : {}", config.feeds.tectonic_plates);
    println!("Timeout         : {}s", config.feeds.timeout_seconds);
    println!("Output path     : {}", config.output.path);
    if config.output.bundle {
        println!("Bundle          : {}", config.output.bundle_filename);
    }
    println!("Base layers     :");
    for layer in &config.map.base_layers {
        println!("  - {} ({})", layer.name, layer.url_template);
    }
    println!("Depth legend    :");
    for entry in legend_labels(&DEPTH_LEGEND) {
        println!("  {:>8}  {}", entry.color.css(), entry.label);
    }
    tracing::debug!("Resolved config: {}", serde_json::to_string_pretty(config)?);
    Ok(())
}
