use std::collections::HashMap;
use std::error::Error;
use std::path::Path;

use config::{Config, Environment, File};
use eyre::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Load a settings object from the config locations.
/// Further documentation can be found in the `settings` module.
pub(crate) fn load_settings_object<T>(
    prefix: &str,
    config_dir: &Path,
    env: HashMap<String, String>,
) -> Result<T>
where
    T: DeserializeOwned,
{
    let mut base_config_sources = vec![];
    let mut builder = Config::builder();

    // Load every json file in the config directory, if there is one
    if config_dir.is_dir() {
        let mut paths = config_dir
            .read_dir()
            .with_context(|| format!("Failed to open config directory {config_dir:?}"))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect::<Vec<_>>();
        paths.sort();
        for path in paths {
            base_config_sources.push(format!("{path:?}"));
            builder = builder.add_source(File::from(path));
        }
    }

    // Load a set of additional user specified config files
    let config_file_paths: Vec<String> = env
        .get("CONFIG_FILES")
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let builder = config_file_paths.iter().fold(builder, |builder, path| {
        builder.add_source(File::with_name(path))
    });

    let config_deserializer = builder
        .add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(env)),
        )
        .build()?;

    match Config::try_deserialize::<T>(config_deserializer) {
        Ok(cfg) => {
            debug!(sources = ?base_config_sources, files = ?config_file_paths, "Loaded settings");
            Ok(cfg)
        }
        Err(err) => {
            let mut err = if let Some(source_err) = err.source() {
                let source = format!("Config error source: {source_err}");
                Err(err).context(source)
            } else {
                Err(err.into())
            };

            for cfg_path in base_config_sources.iter().chain(config_file_paths.iter()) {
                err = err.with_context(|| format!("Config loaded: {cfg_path}"));
            }
            err
        }
    }
}
