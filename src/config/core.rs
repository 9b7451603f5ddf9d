use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::rendering::{RenderConfig, ShaderConfig};
use super::window::{ContextConfig, WindowConfig};

pub const CONFIG_FILE_NAME: &str = "harness.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub log_level: String,
    pub window: WindowConfig,
    pub context: ContextConfig,
    pub rendering: RenderConfig,
    pub shaders: ShaderConfig,
    /// Image bound to texture unit 0. Rendering continues without it when
    /// it cannot be loaded.
    pub texture: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            log_level: String::from("info"),
            window: WindowConfig::default(),
            context: ContextConfig::default(),
            rendering: RenderConfig::default(),
            shaders: ShaderConfig::default(),
            texture: Some(PathBuf::from("assets/container.jpg")),
        }
    }
}

impl HarnessConfig {
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &text)
    }

    /// Loads the first config file that exists, or the defaults.
    ///
    /// An explicit path must exist. Without one, `./harness.toml` is tried,
    /// then the platform config directory.
    pub fn locate(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        let candidates = std::iter::once(PathBuf::from(CONFIG_FILE_NAME)).chain(
            ProjectDirs::from("", "", "glharness")
                .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME)),
        );
        for path in candidates {
            if path.is_file() {
                return Ok((Self::load(&path)?, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }

    /// Falls back to `Info` for unknown level names.
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_open_an_800x600_gl33_core_window() {
        let config = HarnessConfig::default();
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!((config.context.major, config.context.minor), (3, 3));
        assert!(config.context.core_profile);
        assert_eq!(config.rendering.clear_color, [0.2, 0.3, 0.3, 1.0]);
        assert_eq!(config.shaders.vertex, PathBuf::from("shaders/basic.vert"));
        assert_eq!(config.rendering.wireframe, cfg!(feature = "wireframe"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let text = r#"
            log_level = "debug"

            [window]
            title = "triangle"

            [rendering]
            wireframe = true
        "#;
        let config = HarnessConfig::from_toml(Path::new("inline.toml"), text).unwrap();
        assert_eq!(config.window.title, "triangle");
        assert_eq!(config.window.width, 800);
        assert!(config.rendering.wireframe);
        assert_eq!(config.rendering.spin_speed, 1.0);
        assert_eq!(config.level_filter(), LevelFilter::Debug);
        assert_eq!(config.texture, HarnessConfig::default().texture);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[shaders]\nvertex = \"a.vert\"\nfragment = \"b.frag\"").unwrap();

        let (config, used) = HarnessConfig::locate(Some(file.path())).unwrap();
        assert_eq!(used.as_deref(), Some(file.path()));
        assert_eq!(config.shaders.vertex, PathBuf::from("a.vert"));
        assert_eq!(config.shaders.fragment, PathBuf::from("b.frag"));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let err = HarnessConfig::from_toml(Path::new("broken.toml"), "window = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = HarnessConfig::locate(Some(Path::new("nowhere/harness.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let config = HarnessConfig {
            log_level: String::from("chatty"),
            ..HarnessConfig::default()
        };
        assert_eq!(config.level_filter(), LevelFilter::Info);
    }
}
