//! `env_logger` setup for the three verbosity modes.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Builder, Target};
use log::{Level, LevelFilter};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

/// Writes log output to stdout and, with ANSI escapes removed, to a file.
struct Tee {
    file: strip_ansi_escapes::Writer<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}

pub(crate) fn level_for(quiet: bool, verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    }
}

/// One non-verbose log line. Errors and warnings carry the only prefix the
/// line gets.
pub(crate) fn plain_line(level: Level, message: &dyn Display) -> String {
    match level {
        Level::Error => format!("{} {}", "error:".if_supports_color(Stdout, |t| t.red()), message),
        Level::Warn => format!("{} {}", "warning:".if_supports_color(Stdout, |t| t.yellow()), message),
        _ => message.to_string(),
    }
}

/// Install the global logger. `RUST_LOG` overrides the level chosen by the
/// flags.
///
/// Plain info lines are printed as-is since commands report through `log`.
/// Verbose mode adds timestamps, levels and module paths.
pub(crate) fn init(quiet: bool, verbose: bool, logfile: Option<&Path>) -> io::Result<()> {
    let mut builder = Builder::new();
    builder.filter_level(level_for(quiet, verbose)).parse_default_env();

    if verbose {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {} {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        });
    } else {
        builder.format(|buf, record| writeln!(buf, "{}", plain_line(record.level(), record.args())));
    }

    match logfile {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            builder.target(Target::Pipe(Box::new(Tee {
                file: strip_ansi_escapes::Writer::new(file),
            })));
        }
        None => {
            builder.target(Target::Stdout);
        }
    }

    builder
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))
}
