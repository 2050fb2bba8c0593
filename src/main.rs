use clap::Parser;
use ipfilter_vault::cli::Cli;
use ipfilter_vault::{commands, Config};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Keep main thin; everything testable lives in the library
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli)?;
    log::info!("#Start main()");

    let config = Config::load(cli.config.as_deref())?;
    let allowed = commands::run(&cli.command, &config, &mut std::io::stdout().lock())?;
    if !allowed {
        std::process::exit(1);
    }
    Ok(())
}

/// log4rs from the config file when present, else a stderr console logger.
/// `--verbose` always selects the console logger at debug level.
fn init_logging(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if let Some(file) = cli.log_config_file() {
        log4rs::init_file(file, Default::default())
            .map_err(|e| format!("Error initializing log4rs: {e}"))?;
        return Ok(());
    }
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = log4rs::config::Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}
