use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use log::LevelFilter;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prompt: String,
    pub heredoc_prompt: String,
    pub heredoc_dir: PathBuf,
    pub log_level: LevelFilter,
    pub log_file: Option<PathBuf>,
    pub env_vars: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {msg}")]
    Parse { line: usize, msg: String },
}

impl Default for Config {
    fn default() -> Self {
        ConfigLoader::default_config()
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config() -> Config {
        Config {
            prompt: "minishell$ ".to_string(),
            heredoc_prompt: "> ".to_string(),
            heredoc_dir: std::env::temp_dir(),
            log_level: LevelFilter::Off,
            log_file: None,
            env_vars: BTreeMap::new(),
        }
    }

    /// `$MINISHELL_RC`, else `$HOME/.minishellrc`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os("MINISHELL_RC") {
            return Some(PathBuf::from(path));
        }
        std::env::var_os("HOME").map(|home| Path::new(&home).join(".minishellrc"))
    }

    /// Load the rc file if there is one. A missing file means defaults.
    pub fn load() -> Result<Config, ConfigError> {
        let mut config = match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from_file(&path)?,
            _ => Self::default_config(),
        };
        if let Ok(level) = std::env::var("MINISHELL_LOG") {
            config.log_level = parse_level(&level).unwrap_or(config.log_level);
        }
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_from_str(&src)
    }

    pub fn load_from_str(src: &str) -> Result<Config, ConfigError> {
        let mut config = Self::default_config();

        for (lineno, line) in src.lines().enumerate() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parse_err = |msg: String| ConfigError::Parse { line: lineno + 1, msg };
            let Some((key, value)) = line.split_once('=') else {
                return Err(parse_err(format!("no '=' found: {}", line)));
            };
            let key = key.trim();

            match key {
                "prompt" => config.prompt = value.to_string(),
                "heredoc_prompt" => config.heredoc_prompt = value.to_string(),
                "heredoc_dir" => config.heredoc_dir = PathBuf::from(value.trim()),
                "log_file" => config.log_file = Some(PathBuf::from(value.trim())),
                "log_level" => {
                    config.log_level = parse_level(value.trim())
                        .ok_or_else(|| parse_err(format!("invalid log level: {}", value.trim())))?;
                }
                k if k.starts_with("env.") => {
                    let var = k.trim_start_matches("env.");
                    if !crate::environment::is_valid_name(var) {
                        return Err(parse_err(format!("invalid variable name: {}", var)));
                    }
                    config.env_vars.insert(var.to_string(), value.to_string());
                }
                _ => return Err(parse_err(format!("unknown key: {}", key))),
            }
        }

        Ok(config)
    }
}

fn parse_level(s: &str) -> Option<LevelFilter> {
    match s.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_source_gives_defaults() {
        assert_eq!(ConfigLoader::load_from_str("").unwrap(), ConfigLoader::default_config());
    }

    #[test]
    fn test_keys_are_applied() {
        let src = "# comment\nprompt=$ \nheredoc_prompt=>> \nlog_level=debug\n\
                   log_file=/tmp/minishell.log\nenv.GREETING=hello world\n";
        let config = ConfigLoader::load_from_str(src).unwrap();
        assert_eq!(config.prompt, "$ ");
        assert_eq!(config.heredoc_prompt, ">> ");
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/minishell.log")));
        assert_eq!(config.env_vars.get("GREETING").map(String::as_str), Some("hello world"));
    }

    #[test]
    fn test_missing_equals_is_error() {
        let err = ConfigLoader::load_from_str("prompt\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_unknown_key_is_error() {
        let err = ConfigLoader::load_from_str("\ncolour=red").unwrap_err();
        assert_eq!(err.to_string(), "line 2: unknown key: colour");
    }

    #[test]
    fn test_invalid_values() {
        assert!(ConfigLoader::load_from_str("log_level=loud").is_err());
        assert!(ConfigLoader::load_from_str("env.1X=y").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rc");
        std::fs::write(&path, "prompt=% \n").unwrap();
        assert_eq!(ConfigLoader::load_from_file(&path).unwrap().prompt, "% ");
        assert!(ConfigLoader::load_from_file(dir.path().join("missing")).is_err());
    }
}
