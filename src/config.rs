use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::piece::{PieceKind, RotationMode};

pub const DEFAULT_WIDTH: usize = 10;
pub const DEFAULT_HEIGHT: usize = 20;
pub const DEFAULT_POINTS_PER_LINE: u64 = 10;

/// Everything needed to start a session. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub width: usize,
    pub height: usize,
    pub rotation: RotationMode,
    pub points_per_line: u64,
    /// Seed for the piece randomiser. Unseeded games differ run to run.
    pub seed: Option<u64>,
    /// Cycle through these kinds instead of drawing at random.
    pub pieces: Vec<PieceKind>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            rotation: RotationMode::default(),
            points_per_line: DEFAULT_POINTS_PER_LINE,
            seed: None,
            pieces: Vec::new(),
        }
    }
}

/// The parts of a [`Config`] that stay in force for a whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    pub rotation: RotationMode,
    pub points_per_line: u64,
}

impl Default for Rules {
    fn default() -> Self {
        Config::default().rules()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("couldn't read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("couldn't parse config")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn rules(&self) -> Rules {
        Rules {
            rotation: self.rotation,
            points_per_line: self.points_per_line,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use indoc::indoc;

    use super::*;

    #[test]
    fn empty_is_default() -> anyhow::Result<()> {
        assert_eq!(Config::from_toml_str("")?, Config::default());
        Ok(())
    }

    #[test]
    fn defaults_match_classic_field() {
        let config = Config::default();
        assert_eq!((config.width, config.height), (10, 20));
        assert_eq!(config.rules().points_per_line, 10);
        assert_eq!(config.rotation, RotationMode::Fixed);
        assert!(config.pieces.is_empty());
    }

    #[test]
    fn parse_everything() -> anyhow::Result<()> {
        let config = Config::from_toml_str(indoc! {r#"
            width = 6
            height = 12
            rotation = "quarter-turn"
            points_per_line = 25
            seed = 42
            pieces = ["I", "O", "T"]
        "#})?;
        assert_eq!(
            config,
            Config {
                width: 6,
                height: 12,
                rotation: RotationMode::QuarterTurn,
                points_per_line: 25,
                seed: Some(42),
                pieces: vec![PieceKind::I, PieceKind::O, PieceKind::T],
            }
        );
        Ok(())
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Config::from_toml_str("hold_queue = true"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "width = 8")?;
        let config = Config::load(file.path())?;
        assert_eq!(config.width, 8);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        Ok(())
    }

    #[test]
    fn missing_file() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
