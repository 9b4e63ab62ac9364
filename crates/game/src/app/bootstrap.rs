use std::env;
use std::fs;
use std::path::Path;

use pixel_engine::{EngineOptions, LoopConfig};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV_VAR: &str = "PIXEL_GAME_CONFIG";

type ConfigResult<T> = Result<T, String>;

/// Optional JSON config named by `PIXEL_GAME_CONFIG`. Every field may be
/// omitted.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfigFile {
    pub(crate) window_title: Option<String>,
    pub(crate) exit_on_escape: Option<bool>,
    pub(crate) engine: EngineOptions,
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("pixel_game_startup");

    AppWiring {
        config: loop_config_from(load_config_from_env()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn load_config_from_env() -> GameConfigFile {
    match env::var(CONFIG_ENV_VAR) {
        Ok(path) => match load_config_file(Path::new(&path)) {
            Ok(config) => {
                info!(path = %path, "config_loaded");
                config
            }
            Err(error) => {
                warn!(path = %path, error = %error, "config_load_failed_using_defaults");
                GameConfigFile::default()
            }
        },
        Err(env::VarError::NotPresent) => GameConfigFile::default(),
        Err(error) => {
            warn!(
                env_var = CONFIG_ENV_VAR,
                error = %error,
                "config_env_unreadable_using_defaults"
            );
            GameConfigFile::default()
        }
    }
}

pub(crate) fn load_config_file(path: &Path) -> ConfigResult<GameConfigFile> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("read config '{}': {error}", path.display()))?;
    parse_config_json(&raw)
}

fn parse_config_json(raw: &str) -> ConfigResult<GameConfigFile> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, GameConfigFile>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse config json: {source}"))
            } else {
                Err(format!("parse config json at {path}: {source}"))
            }
        }
    }
}

pub(crate) fn loop_config_from(file: GameConfigFile) -> LoopConfig {
    let mut config = LoopConfig::default();
    if let Some(window_title) = file.window_title {
        config.window_title = window_title;
    }
    if let Some(exit_on_escape) = file.exit_on_escape {
        config.exit_on_escape = exit_on_escape;
    }
    config.engine = config.engine.with_options(&file.engine);
    config
}
