use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// `quiet_level` applies when not verbose; the server passes `info` so it is not silent.
pub fn init_logging(verbose: bool, quiet_level: LevelFilter) {
    let level_filter = if verbose {
        LevelFilter::DEBUG
    } else {
        quiet_level
    };
    let app_filter = Targets::new()
        .with_target("vesrates", level_filter)
        .with_default(LevelFilter::WARN.min(level_filter));
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_filter.to_string()));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(app_filter)
        .with(env_filter)
        .init();
}
