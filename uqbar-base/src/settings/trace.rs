use std::collections::BTreeMap;

use eyre::Result;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    prelude::*,
    registry::LookupSpan,
    Layer,
};

/// Targets that log every poll attempt or reconnect at debug level; they are
/// held at info unless tracing is at trace level.
const CHATTY_TARGETS: [&str; 2] = ["uqbar_base::polling", "uqbar_base::subscription"];

/// Logging level. A higher level logs more. Unknown names read as `Info`.
#[derive(Default, Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq)]
pub enum Level {
    /// Off
    Off,
    /// Error
    Error,
    /// Warn
    Warn,
    /// Info
    #[default]
    Info,
    /// Debug
    Debug,
    /// Trace
    Trace,
}

impl<'de> serde::Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(match name.to_lowercase().as_str() {
            "off" => Level::Off,
            "error" => Level::Error,
            "warn" => Level::Warn,
            "debug" => Level::Debug,
            "trace" => Level::Trace,
            _ => Level::Info,
        })
    }
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> LevelFilter {
        match level {
            Level::Off => LevelFilter::OFF,
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Info => LevelFilter::INFO,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
        }
    }
}

/// Output format of the log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    /// Multi-line, human oriented
    Pretty,
    /// One JSON object per line
    Json,
    /// Single line, no span context
    Compact,
    /// Single line with span context
    #[serde(other)]
    #[default]
    Full,
}

impl Style {
    fn layer<S>(self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = tracing_subscriber::fmt::layer();
        match self {
            Style::Pretty => layer.pretty().boxed(),
            Style::Json => layer.json().boxed(),
            Style::Compact => layer.compact().boxed(),
            Style::Full => layer.boxed(),
        }
    }
}

/// How the wallet logs
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct TracingConfig {
    /// Output format
    #[serde(default)]
    pub fmt: Style,
    /// Default verbosity
    #[serde(default)]
    pub level: Level,
    /// Verbosity per target, e.g. `{"uqbar_wallet::signing": "debug"}`
    #[serde(default)]
    pub targets: BTreeMap<String, Level>,
}

impl TracingConfig {
    /// Which events pass, by target
    pub fn filter(&self) -> Targets {
        let mut filter = Targets::new().with_default(self.level);
        if self.level < Level::Trace {
            for target in CHATTY_TARGETS {
                filter = filter.with_target(target, self.level.min(Level::Info));
            }
        }
        filter.with_targets(self.targets.iter().map(|(target, level)| (target.clone(), *level)))
    }

    /// The subscriber described by this configuration
    pub fn subscriber(&self) -> impl Subscriber + Send + Sync {
        tracing_subscriber::Registry::default()
            .with(self.filter())
            .with(self.fmt.layer())
            .with(tracing_error::ErrorLayer::default())
    }

    /// Register the subscriber globally. Fails if one is already set.
    pub fn start_tracing(&self) -> Result<()> {
        self.subscriber().try_init()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use tracing::Level as TraceLevel;

    use super::*;

    #[test]
    fn unknown_values_fall_back_to_defaults() {
        let cfg: TracingConfig =
            serde_json::from_str(r#"{ "fmt": "fancy", "level": "verbose" }"#).unwrap();
        assert_eq!(cfg.fmt, Style::Full);
        assert_eq!(cfg.level, Level::Info);

        let cfg: TracingConfig = serde_json::from_str(r#"{ "level": "trace" }"#).unwrap();
        assert_eq!(cfg.level, Level::Trace);
        let cfg: TracingConfig = serde_json::from_str(r#"{ "level": "WARN" }"#).unwrap();
        assert_eq!(cfg.level, Level::Warn);
        assert!(Level::Info < Level::Debug);
        assert_eq!(LevelFilter::from(Level::Warn), LevelFilter::WARN);
    }

    #[test]
    fn polling_stays_quiet_below_trace() {
        let cfg: TracingConfig = serde_json::from_str(
            r#"{ "level": "debug", "targets": { "uqbar_wallet::signing": "trace" } }"#,
        )
        .unwrap();
        let filter = cfg.filter();
        assert!(filter.would_enable("uqbar_wallet::store", &TraceLevel::DEBUG));
        assert!(!filter.would_enable("uqbar_base::polling", &TraceLevel::DEBUG));
        assert!(filter.would_enable("uqbar_base::polling", &TraceLevel::INFO));
        assert!(filter.would_enable("uqbar_wallet::signing", &TraceLevel::TRACE));

        let cfg = TracingConfig {
            level: Level::Trace,
            ..Default::default()
        };
        assert!(cfg.filter().would_enable("uqbar_base::polling", &TraceLevel::TRACE));
    }

    #[test]
    fn subscriber_records_events() {
        let cfg = TracingConfig {
            fmt: Style::Compact,
            level: Level::Warn,
            ..Default::default()
        };
        tracing::subscriber::with_default(cfg.subscriber(), || {
            tracing::warn!("visible");
            assert!(!tracing::enabled!(TraceLevel::INFO));
        });
    }
}
