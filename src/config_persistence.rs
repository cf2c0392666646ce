//! Loading and comment-preserving persistence of `config.toml`.

use std::path::Path;

use log::{debug, error, info, warn};
use toml_edit::{DocumentMut, Item, Table};

use crate::config::{sanitize_config, Config};

/// Writes `item` under `key`, carrying over the inline decor (spacing and
/// trailing comment) of the value it replaces.
fn replace_value_keeping_decor(table: &mut Table, key: &str, item: &Item) {
    let previous_decor = table
        .get(key)
        .and_then(Item::as_value)
        .map(|value| value.decor().clone());

    let mut item = item.clone();
    if let (Some(decor), Some(value)) = (previous_decor, item.as_value_mut()) {
        *value.decor_mut() = decor;
    }
    table[key] = item;
}

fn same_value(left: &toml_edit::Value, right: &toml_edit::Value) -> bool {
    left.to_string().trim() == right.to_string().trim()
}

/// Folds the freshly serialized `model` table into `document`, touching only
/// values that differ. Comments and keys unknown to the model are left alone.
fn overlay_model_table(document: &mut Table, model: &Table) {
    for (key, model_item) in model.iter() {
        match (document.get_mut(key), model_item) {
            (Some(Item::Table(existing)), Item::Table(model_table)) => {
                overlay_model_table(existing, model_table);
            }
            (_, Item::Table(model_table)) => {
                let mut fresh = Table::new();
                overlay_model_table(&mut fresh, model_table);
                document.insert(key, Item::Table(fresh));
            }
            (Some(Item::Value(existing)), Item::Value(model_value))
                if same_value(existing, model_value) => {}
            (_, Item::Value(_)) => replace_value_keeping_decor(document, key, model_item),
            (_, other) => {
                document.insert(key, other.clone());
            }
        }
    }
}

/// Re-serializes `config` on top of `existing_text` so user comments survive.
pub fn serialize_config_with_preserved_comments(
    existing_text: &str,
    config: &Config,
) -> Result<String, String> {
    let model_text = toml::to_string(config)
        .map_err(|err| format!("Failed to serialize config: {}", err))?;
    let model = model_text
        .parse::<DocumentMut>()
        .map_err(|err| format!("Failed to re-read serialized config: {}", err))?;
    let mut document = existing_text
        .parse::<DocumentMut>()
        .map_err(|err| format!("Failed to parse existing config: {}", err))?;

    overlay_model_table(document.as_table_mut(), model.as_table());
    Ok(document.to_string())
}

fn render_config_text(config: &Config, path: &Path) -> Result<String, String> {
    let Ok(existing_text) = std::fs::read_to_string(path) else {
        return toml::to_string(config).map_err(|err| format!("Failed to serialize config: {}", err));
    };
    serialize_config_with_preserved_comments(&existing_text, config).or_else(|err| {
        warn!(
            "Could not keep comments in {} ({}); rewriting it from scratch",
            path.display(),
            err
        );
        toml::to_string(config).map_err(|err| format!("Failed to serialize config: {}", err))
    })
}

/// Writes `config` to `path`, creating parent directories. Failures are logged.
pub fn persist_config_file(config: &Config, path: &Path) {
    let written = render_config_text(config, path).and_then(|config_text| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("Failed to create {}: {}", parent.display(), err))?;
        }
        std::fs::write(path, config_text)
            .map_err(|err| format!("Failed to write {}: {}", path.display(), err))
    });
    match written {
        Ok(()) => debug!("Config written to {}", path.display()),
        Err(err) => error!("{}", err),
    }
}

/// Reads `config.toml`, creating it with defaults when missing.
///
/// Unreadable or unparsable files fall back to defaults and are left untouched.
pub fn load_config_file(path: &Path) -> Config {
    if !path.exists() {
        info!(
            "Config file not found. Creating default config. path={}",
            path.display()
        );
        let default_config = Config::default();
        persist_config_file(&default_config, path);
        return default_config;
    }

    let config_content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!(
                "Failed to read config file {}. Using defaults. error={}",
                path.display(),
                err
            );
            return Config::default();
        }
    };

    match toml::from_str::<Config>(&config_content) {
        Ok(config) => sanitize_config(config),
        Err(err) => {
            warn!(
                "Failed to parse config file {}. Using defaults. error={}",
                path.display(),
                err
            );
            Config::default()
        }
    }
}
