use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Install the CLI logger. Dependencies log at `Warn`; this crate at `Info`, or `Debug` when
/// `verbose`. `RUST_LOG` still applies on top. Safe to call more than once.
///
/// Debug lines carry the thread name so dispatch workers (`profsearch-worker-N`) can be told
/// apart from the calling thread.
pub fn setup_logging(verbose: bool) {
    let level = match verbose {
        true => LevelFilter::Debug,
        false => LevelFilter::Info,
    };

    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME").cyan();
            let line = match record.level() {
                Level::Error => format!("[{} {}] {}", name, "ERROR".red(), record.args()),
                Level::Warn => format!(
                    "[{} {} {}] {}",
                    name,
                    "WARN".yellow(),
                    record.target().white(),
                    record.args()
                ),
                Level::Info => format!("[{}] {}", name, record.args()),
                Level::Debug | Level::Trace => {
                    let current = std::thread::current();
                    let thread = current.name().unwrap_or("unnamed");
                    format!("[{} {}] {}", name, thread.dimmed(), record.args())
                }
            };
            writeln!(buf, "{}", line)
        })
        .try_init();
}
