use clap::Parser;
use etl_automator::utils::{logger, validation::Validate};
use etl_automator::{
    AutomatorConfig, AutomatorPipeline, CliArgs, DestinationDescriptor, EtlEngine, EtlError,
    LocalStorage, SourceDescriptor,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting etl-automator");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match AutomatorConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    if let Err(e) = config.validate() {
        fail(e);
    }
    tracing::info!("✅ Configuration loaded and validated successfully");

    if args.dry_run {
        display_config_summary(&config);
        return;
    }

    let storage = LocalStorage::new(config.working_directory());
    let pipeline = AutomatorPipeline::new(storage, config);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(output) => {
            tracing::info!("✅ ETL process completed successfully!");
            println!("✅ ETL process completed successfully!");
            println!("📁 Output written to: {}", output);
        }
        Err(e) => fail(e),
    }
}

fn fail(e: EtlError) -> ! {
    tracing::error!(
        "❌ ETL process failed: {} (Kind: {}, Category: {:?})",
        e,
        e.kind(),
        e.category()
    );
    eprintln!("❌ {}: {}", e.kind(), e);
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

fn display_config_summary(config: &AutomatorConfig) {
    println!("📋 Configuration Summary:");
    println!("  Working directory: {}", config.working_directory().display());

    println!("  Sources:");
    for (index, source) in config.data_sources.iter().enumerate() {
        let kind = match source {
            SourceDescriptor::Api(_) => "api",
            SourceDescriptor::File(_) => "csv",
        };
        println!("    #{} [{}] {}", index + 1, kind, source.location());
        for (output, native) in source.field_mapping() {
            println!("      {} <- {}", output, native);
        }
    }

    println!("  Transforms:");
    for spec in &config.pipeline.transforms {
        println!(
            "    {} = {:?} (reads: {})",
            spec.output,
            spec.operation,
            spec.operation.referenced_fields().join(", ")
        );
    }

    let kind = match &config.pipeline.destination {
        DestinationDescriptor::File(_) => "csv",
        DestinationDescriptor::Api(_) => "api",
    };
    println!(
        "  Destination: [{}] {}",
        kind,
        config.pipeline.destination.location()
    );
    println!();
    println!("🔍 Dry run complete; no sources were read and nothing was written.");
}
