//! Configuration loading from pinbench.toml
//!
//! PinBench configuration can be specified in a `pinbench.toml` file next to
//! the benchmark data. The configuration is automatically discovered by
//! walking up from the current directory. Command line flags always win.

use pinbench_core::DEFAULT_MEMORY_LIMIT_FLAG;
use pinbench_engines::Framework;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up by [`PinConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "pinbench.toml";

/// PinBench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PinConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Engine executable overrides
    #[serde(default)]
    pub executables: ExecutablesConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// Completion notification
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Runner configuration for engine invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Timeout for a single engine invocation (e.g., "300s", "5m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Exclude larger models of a setting after repeated failures
    #[serde(default = "default_timeout_skip")]
    pub timeout_skip: bool,
    /// JVM flag inserted when the memory limit is requested
    #[serde(default = "default_memory_limit_flag")]
    pub memory_limit_flag: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            timeout_skip: default_timeout_skip(),
            memory_limit_flag: default_memory_limit_flag(),
        }
    }
}

fn default_timeout() -> String {
    "300s".to_string()
}
fn default_timeout_skip() -> bool {
    true
}
fn default_memory_limit_flag() -> String {
    DEFAULT_MEMORY_LIMIT_FLAG.to_string()
}

/// Per-framework executable (jar, binary or library directory) overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutablesConfig {
    /// Forclift jar
    #[serde(default)]
    pub forclift: Option<PathBuf>,
    /// GC-FOVE jar
    #[serde(default)]
    pub gcfove: Option<PathBuf>,
    /// Junction tree jar
    #[serde(default)]
    pub jt: Option<PathBuf>,
    /// Alchemy binary
    #[serde(default)]
    pub alchemy: Option<PathBuf>,
    /// BLOG library directory
    #[serde(default)]
    pub blog: Option<PathBuf>,
}

impl ExecutablesConfig {
    /// Override configured for `framework`, if any.
    pub fn get(&self, framework: Framework) -> Option<&Path> {
        match framework {
            Framework::Forclift => self.forclift.as_deref(),
            Framework::Gcfove => self.gcfove.as_deref(),
            Framework::Jt => self.jt.as_deref(),
            Framework::Alchemy => self.alchemy.as_deref(),
            Framework::Blog => self.blog.as_deref(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the run log, result table and overview log
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Summary format printed at the end: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            format: default_format(),
        }
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}
fn default_format() -> String {
    "human".to_string()
}

/// Command run once all work is done
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    /// Program and arguments; `{directory}` is replaced by the model directory
    #[serde(default)]
    pub command: Vec<String>,
}

impl PinConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# PinBench Configuration

[runner]
# Wall-clock limit for one engine invocation
timeout = "300s"
# Skip larger models of a setting after two consecutive failing files
timeout_skip = true
# JVM flag used with --java-xmx
memory_limit_flag = "-Xmx16384M"

[executables]
# Override engine locations (uncomment to enable)
# forclift = "forclift.jar"
# gcfove = "gcfove.jar"
# jt = "fojt.jar"
# alchemy = "./Alchemy_liftedinfer"
# blog = "BLOGEngine"

[output]
# Directory for the run log, result table and overview log
directory = "."
# Summary format: human or json
format = "human"

[notify]
# Command run after the last file (uncomment to enable)
# command = ["notify-send", "pinbench finished", "{directory}"]
"#
        .to_string()
    }

    /// Parse duration string (e.g., "300s", "500ms", "5m", "1h")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration number: {}", num_part));
        }

        let seconds: f64 = match unit_part.to_lowercase().as_str() {
            "ms" => 0.001,
            "s" | "" => 1.0,
            "m" | "min" => 60.0,
            "h" => 3_600.0,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_secs_f64(value * seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PinConfig::default();
        assert_eq!(config.runner.timeout, "300s");
        assert!(config.runner.timeout_skip);
        assert_eq!(config.runner.memory_limit_flag, "-Xmx16384M");
        assert_eq!(config.output.format, "human");
        assert!(config.notify.command.is_empty());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(
            PinConfig::parse_duration("300s").unwrap(),
            Duration::from_secs(300)
        );
        assert_eq!(
            PinConfig::parse_duration("500ms").unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(
            PinConfig::parse_duration("5m").unwrap(),
            Duration::from_secs(300)
        );
        assert_eq!(
            PinConfig::parse_duration("1h").unwrap(),
            Duration::from_secs(3_600)
        );
        assert_eq!(PinConfig::parse_duration("42").unwrap(), Duration::from_secs(42));
        assert!(PinConfig::parse_duration("").is_err());
        assert!(PinConfig::parse_duration("3 weeks").is_err());
        assert!(PinConfig::parse_duration("-1s").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            timeout = "10m"

            [executables]
            jt = "/opt/jt/fojt.jar"

            [notify]
            command = ["echo", "{directory}"]
        "#;

        let config: PinConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.timeout, "10m");
        assert_eq!(
            config.executables.get(Framework::Jt),
            Some(Path::new("/opt/jt/fojt.jar"))
        );
        assert_eq!(config.executables.get(Framework::Blog), None);
        assert_eq!(config.notify.command, vec!["echo", "{directory}"]);
        // Defaults should still apply
        assert!(config.runner.timeout_skip);
        assert_eq!(config.output.directory, ".");
    }

    #[test]
    fn test_default_toml_parses() {
        let config: PinConfig = toml::from_str(&PinConfig::default_toml()).unwrap();
        assert_eq!(config.runner.timeout, "300s");
        assert_eq!(config.output.format, "human");
    }
}
