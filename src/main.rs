use clap::Parser;
use gradiator::config::command::{parse_sequence, usage};
use gradiator::utils::{logger, validation::Validate};
use gradiator::{CliConfig, GradeEngine, GradiatorError, Settings, TomlConfig};

fn main() {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose, config.log_json);
    tracing::debug!("CLI config: {:?}", config.commands);

    if let Err(e) = run(&config) {
        tracing::error!(
            "❌ gradiator failed: {} (Category: {:?})",
            e,
            e.category()
        );

        if let Some(path) = e.grade_file() {
            eprintln!("{}", path.display());
        }
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        if matches!(e, GradiatorError::CommandError { .. }) {
            eprintln!("\nCommands:\n{}", usage());
        }

        std::process::exit(e.exit_code());
    }
}

fn run(config: &CliConfig) -> gradiator::Result<()> {
    let file_config = match &config.config {
        Some(path) => {
            let file_config = TomlConfig::from_file(path)?;
            file_config.validate()?;
            Some(file_config)
        }
        None => None,
    };

    let settings = Settings::resolve(file_config.as_ref(), config.overrides())?;
    if settings.is_dry_run() {
        tracing::debug!("Delivery: dry run");
    }

    // Validate the whole sequence before the first step touches anything.
    let commands = parse_sequence(&config.commands)?;

    let mut engine = GradeEngine::new(settings);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    engine.run(&commands, &mut out)?;

    tracing::info!("✅ Finished {} command(s)", commands.len());
    Ok(())
}
