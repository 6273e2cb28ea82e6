use std::{io::Write, path::PathBuf};

use anyhow::Context;
use clap::{Parser, crate_name};
use multiprof::config::{Config, display_config, load_config};
use multiprof::embedded;
use multiprof::{
    command::{Commands, Options},
    run::RunContext,
};

fn main() -> anyhow::Result<()> {
    let crate_name = crate_name!();

    let options = Options::parse();
    let config = load_config(&options.common.config)?;

    let mut logger_builder = pretty_env_logger::formatted_builder();

    // configuration file
    let default_log_level = config.log_level;
    logger_builder.filter_module(crate_name, default_log_level);
    // overrides
    if let Ok(filter) = std::env::var("RUST_LOG") {
        logger_builder.parse_filters(&filter);
    };
    // option
    if options.common.verbose != 0 {
        let mut iter = log::LevelFilter::iter().fuse();
        // find the default log level
        iter.find(|level| *level == default_log_level);
        for _ in 0..(options.common.verbose - 1) {
            iter.next();
        }
        // since our iter is a Fuse, it must return None if we already reach the max
        // level
        let level = match iter.next() {
            Some(l) => l,
            None => log::LevelFilter::max(),
        };
        logger_builder.filter_module(crate_name, level);
    }
    if let Some(filter) = options.common.log_level {
        logger_builder.filter_module(crate_name, filter);
    }
    let builder_debug_info = format!("{logger_builder:?}");
    logger_builder.try_init()?;
    log::debug!("logger initialized with configuration: {builder_debug_info}");

    log::debug!("parsed options: {options:#?}");

    let directory = options.common.directory;
    match options.command {
        Commands::List(list_opts) => open(config, directory)?.list(&list_opts)?,
        Commands::Active => open(config, directory)?.active()?,
        Commands::Create(create_opts) => open(config, directory)?.create(create_opts)?,
        Commands::Activate(select) => open(config, directory)?.update(select.id, true)?,
        Commands::Deactivate(select) => open(config, directory)?.update(select.id, false)?,
        Commands::Remove(remove_opts) => open(config, directory)?.remove(remove_opts)?,
        Commands::Gc(gc_opts) => open(config, directory)?.gc(gc_opts)?,
        Commands::Migrate => open(config, directory)?.migrate()?,
        Commands::Validate => {
            println!("{}", display_config(&config)?);
        }
        Commands::ExampleConfig => {
            let example = embedded::Etc::get("example-config.toml")
                .context("failed to extract embedded example configuration file")?;
            std::io::stdout()
                .write_all(&example.data)
                .context("failed to write example configuration to stdout")?;
            std::io::stdout()
                .flush()
                .context("failed to flush stdout")?;
        }
    }
    Ok(())
}

fn open(config: Config, directory: Option<PathBuf>) -> anyhow::Result<RunContext> {
    log::debug!("loaded config:\n{}", display_config(&config)?);
    let context = RunContext::new(config, directory)?;
    log::trace!("context = {context:#?}");
    Ok(context)
}
