use once_cell::sync::Lazy;
pub use slog::*;

#[cfg(test)]
mod tests;

/// Output shape of the root logger, selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Term,
    Json,
}

impl LogFormat {
    /// Anything other than `json` (case-insensitive) means terminal output.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Term
        }
    }
}

fn wrap<D: Drain<Err = Never, Ok = ()> + Send + 'static>(drain: D) -> Fuse<slog_async::Async> {
    slog_async::Async::default(slog_envlogger::new(drain)).fuse()
}

/// Builds a root logger writing to stderr, keeping stdout for command output.
pub fn root(format: LogFormat) -> Logger {
    let drain = match format {
        LogFormat::Json => wrap(slog_json::Json::default(std::io::stderr()).fuse()),
        LogFormat::Term => wrap(
            slog_term::FullFormat::new(slog_term::TermDecorator::new().stderr().build())
                .build()
                .fuse(),
        ),
    };
    Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

pub static DEFAULT: Lazy<Logger> = Lazy::new(|| {
    let format = crate::config::get("LOG_FORMAT").unwrap_or_default();
    root(LogFormat::parse(&format))
});
