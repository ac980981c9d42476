//! `nmapkit_log` v1:
//! `tracing-subscriber` setup shared by the nmapkit crates and bridges.

use colored::{ColoredString, Colorize};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent};
use tracing_subscriber::registry::LookupSpan;

/// Default filter directive when neither caller nor `RUST_LOG` set one.
pub const C_LOG_LEVEL_DEFAULT: &str = "info";

/// Compact event formatter: a colored level symbol followed by the fields.
pub struct NmapkitFormatter;

/// Level symbol and its coloring.
pub fn derive_level_symbol(level: &Level) -> (&'static str, fn(ColoredString) -> ColoredString) {
    match *level {
        Level::TRACE => ("[ ]", |s| s.dimmed()),
        Level::DEBUG => ("[?]", |s| s.blue()),
        Level::INFO => ("[+]", |s| s.green().bold()),
        Level::WARN => ("[*]", |s| s.yellow().bold()),
        Level::ERROR => ("[-]", |s| s.red().bold()),
    }
}

impl<S, N> FormatEvent<S, N> for NmapkitFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let (c_symbol, color_func) = derive_level_symbol(event.metadata().level());
        write!(writer, "{} ", color_func(c_symbol.into()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global stderr subscriber.
///
/// `RUST_LOG` wins over `level`. Returns `Ok(false)` when a global subscriber
/// was already installed, `Err` when `level` is not a valid filter directive.
pub fn init_logging(level: &str) -> Result<bool, String> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|err| format!("Invalid log level {level:?}: {err}"))?,
    };

    let if_installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .event_format(NmapkitFormatter)
        .try_init()
        .is_ok();
    Ok(if_installed)
}
