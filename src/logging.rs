pub use log::LevelFilter::*;

/// Configures the process-wide logger.
pub fn init_logging(verbosity: log::LevelFilter) {
    fern::Dispatch::new()
        .level(verbosity)
        .format(|out, message, record| {
            if record.level() >= Debug {
                out.finish(format_args!("{}: {}", record.target(), message))
            } else if record.level() <= Warn {
                out.finish(format_args!("[{}] {}: {}", record.level(), record.target(), message))
            } else {
                out.finish(format_args!("{}", message))
            }
        })
        .chain(std::io::stdout())
        .apply()
        .expect("Failed to set up logging. init_logging should only be called once per process.");
}
