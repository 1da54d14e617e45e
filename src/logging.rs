//! Logger setup.
//!
//! Installs a [`fern`] dispatcher behind the [`log`] facade. Lines look like
//! `[14:02:11 INFO meshview::view] initialized 1280x720 surface`.

use log::LevelFilter;

use crate::error::Result;

/// Parses a level name such as `"debug"`, falling back to `Info`.
pub fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Info)
}

/// Installs the global logger. Fails if a logger is already installed.
pub fn init(level: LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        // SDL and GL loaders are noisy at debug
        .level_for("sdl2", LevelFilter::Warn)
        .chain(std::io::stdout())
        .apply()?;

    log::debug!("logging initialized at {level}");
    Ok(())
}
