use backtrace::Backtrace;
use failure::{format_err, ResultExt};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::path::Path;
use std::thread;

use crate::dirs::log_file_path;

/// Writes log records to `~/.argform/log/<name>.log`. Release builds log
/// from `Info` up unless `verbose` is set. Panics are logged too, with the
/// part of the backtrace that belongs to this crate.
pub fn install_logger(name: &str, verbose: bool) -> Result<(), failure::Error> {
    let level = if verbose || cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };

    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    let path = log_file_path(name)?;
    let file = fern::log_file(&path).with_context(|_| format!("failed to open {}", path.display()))?;
    fern::Dispatch::new()
        .format(move |out, message, record| {
            let thread = thread::current();
            out.finish(format_args!(
                "{:<5} {} {}:{} | {}",
                colors.color(record.level()),
                thread.name().unwrap_or("?"),
                record.file().unwrap_or_else(|| record.target()),
                record.line().unwrap_or(0),
                message
            ))
        })
        .level(level)
        .chain(file)
        .apply()
        .map_err(|err| format_err!("failed to install the logger: {}", err))?;

    // The default hook still prints the message to stderr.
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error!("{}", info);
        let frames = own_frames(&Backtrace::new());
        if !frames.is_empty() {
            error!("backtrace:\n{}", frames.join("\n"));
        }
        previous(info);
    }));

    debug!("logging to {} at {}", path.display(), level);
    Ok(())
}

/// Source files of the standard library and of dependencies.
fn is_foreign(file: &Path) -> bool {
    file.starts_with("/rustc")
        || file
            .components()
            .any(|part| matches!(part.as_os_str().to_str(), Some(".cargo") | Some(".rustup")))
}

/// `#<frame> <file>:<line>` for every symbol in `backtrace` that comes from
/// this crate.
fn own_frames(backtrace: &Backtrace) -> Vec<String> {
    backtrace
        .frames()
        .iter()
        .enumerate()
        .flat_map(|(i, frame)| frame.symbols().iter().map(move |symbol| (i, symbol)))
        .filter_map(|(i, symbol)| {
            let file = symbol.filename()?;
            if is_foreign(file) {
                return None;
            }

            Some(format!("    #{} {}:{}", i, file.display(), symbol.lineno().unwrap_or(0)))
        })
        .collect()
}
