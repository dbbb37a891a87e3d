//! Start-up configuration.
//!
//! Loaded once from the TOML file named by `STATUS_UPDATES_CONFIG` (default
//! `config.toml`) when that file exists, otherwise from environment
//! variables. Both sources fill the same raw shape, which is then validated
//! into a [`Config`].
//!
//! ```toml
//! server_addr = "0.0.0.0:8080"
//! state_path = "data/incidents.json"
//!
//! [daemon]
//! frequency = "30s"
//! execution_timeout = "30m"
//!
//! [discord]
//! token = "..."
//! public_key = "..."
//! guild_id = "123"
//! channel_id = "456"
//! update_role_id = "789"
//!
//! [statuspage]
//! api_key = "..."
//! page_id = "..."
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ed25519_dalek::VerifyingKey;
use serde::Deserialize;
use thiserror::Error;

use crate::interactions::{SignatureError, parse_public_key};
use crate::reconciler::ReconcilerConfig;
use crate::scheduler::{DEFAULT_EXECUTION_TIMEOUT, DEFAULT_INTERVAL, ScheduleConfig};
use crate::types::{ChannelId, GuildId, RoleId};

pub const CONFIG_PATH_VAR: &str = "STATUS_UPDATES_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_STATE_PATH: &str = "data/incidents.json";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required setting {key} (environment variable {env})")]
    Missing {
        key: &'static str,
        env: &'static str,
    },

    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },

    #[error("invalid Discord public key: {0}")]
    InvalidPublicKey(#[from] SignatureError),
}

impl ConfigError {
    fn invalid(name: &'static str, message: impl fmt::Display) -> Self {
        ConfigError::InvalidValue {
            name,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub daemon: DaemonConfig,
    pub discord: DiscordConfig,
    pub statuspage: StatuspageConfig,
    pub server_addr: SocketAddr,
    pub state_path: PathBuf,
    pub json_logs: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaemonConfig {
    pub enabled: bool,
    pub frequency: Duration,
    pub execution_timeout: Duration,
}

#[derive(Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub public_key: VerifyingKey,
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub update_role_id: RoleId,
    pub should_crosspost: bool,
    pub api_base: String,
}

impl fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"<redacted>")
            .field("public_key", &hex::encode(self.public_key.as_bytes()))
            .field("guild_id", &self.guild_id)
            .field("channel_id", &self.channel_id)
            .field("update_role_id", &self.update_role_id)
            .field("should_crosspost", &self.should_crosspost)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Clone)]
pub struct StatuspageConfig {
    pub api_key: String,
    pub page_id: String,
    pub api_base: String,
}

impl fmt::Debug for StatuspageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatuspageConfig")
            .field("api_key", &"<redacted>")
            .field("page_id", &self.page_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Config {
    /// Loads from the config file if present, else from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        if path.exists() {
            Self::from_file(&path)
        } else {
            Self::from_env()
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        raw.validate()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let raw = RawConfig {
            daemon: RawDaemon {
                enabled: get("DAEMON_ENABLED")
                    .map(|v| parse_bool("DAEMON_ENABLED", &v))
                    .transpose()?,
                frequency: get("DAEMON_FREQUENCY"),
                execution_timeout: get("DAEMON_EXECUTION_TIMEOUT"),
            },
            discord: RawDiscord {
                token: get("DISCORD_TOKEN"),
                public_key: get("DISCORD_PUBLIC_KEY"),
                guild_id: parse_env(&get, "DISCORD_GUILD_ID")?,
                channel_id: parse_env(&get, "DISCORD_CHANNEL_ID")?,
                update_role_id: parse_env(&get, "DISCORD_UPDATE_ROLE_ID")?,
                should_crosspost: get("DISCORD_SHOULD_CROSSPOST")
                    .map(|v| parse_bool("DISCORD_SHOULD_CROSSPOST", &v))
                    .transpose()?,
                api_base: get("DISCORD_API_BASE"),
            },
            statuspage: RawStatuspage {
                api_key: get("STATUSPAGE_API_KEY"),
                page_id: get("STATUSPAGE_PAGE_ID"),
                api_base: get("STATUSPAGE_API_BASE"),
            },
            server_addr: get("SERVER_ADDR"),
            state_path: get("STATE_PATH").map(PathBuf::from),
            json_logs: get("JSON_LOGS")
                .map(|v| parse_bool("JSON_LOGS", &v))
                .transpose()?,
            log_level: get("LOG_LEVEL"),
        };
        raw.validate()
    }

    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            guild_id: self.discord.guild_id,
            channel_id: self.discord.channel_id,
            update_role_id: self.discord.update_role_id,
            crosspost: self.discord.should_crosspost,
        }
    }

    pub fn schedule_config(&self) -> ScheduleConfig {
        ScheduleConfig {
            interval: self.daemon.frequency,
            execution_timeout: self.daemon.execution_timeout,
        }
    }
}

// ─── Raw shape shared by both sources ─────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    daemon: RawDaemon,
    discord: RawDiscord,
    statuspage: RawStatuspage,
    server_addr: Option<String>,
    state_path: Option<PathBuf>,
    json_logs: Option<bool>,
    log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawDaemon {
    enabled: Option<bool>,
    frequency: Option<String>,
    execution_timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawDiscord {
    token: Option<String>,
    public_key: Option<String>,
    guild_id: Option<GuildId>,
    channel_id: Option<ChannelId>,
    update_role_id: Option<RoleId>,
    should_crosspost: Option<bool>,
    api_base: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawStatuspage {
    api_key: Option<String>,
    page_id: Option<String>,
    api_base: Option<String>,
}

fn required<T>(value: Option<T>, key: &'static str, env: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::Missing { key, env })
}

impl RawConfig {
    fn validate(self) -> Result<Config, ConfigError> {
        let daemon = DaemonConfig {
            enabled: self.daemon.enabled.unwrap_or(true),
            frequency: duration_or(
                self.daemon.frequency.as_deref(),
                "daemon.frequency",
                DEFAULT_INTERVAL,
            )?,
            execution_timeout: duration_or(
                self.daemon.execution_timeout.as_deref(),
                "daemon.execution_timeout",
                DEFAULT_EXECUTION_TIMEOUT,
            )?,
        };

        let d = self.discord;
        let public_key = parse_public_key(&required(
            d.public_key,
            "discord.public_key",
            "DISCORD_PUBLIC_KEY",
        )?)?;
        let discord = DiscordConfig {
            token: required(d.token, "discord.token", "DISCORD_TOKEN")?,
            public_key,
            guild_id: required(d.guild_id, "discord.guild_id", "DISCORD_GUILD_ID")?,
            channel_id: required(d.channel_id, "discord.channel_id", "DISCORD_CHANNEL_ID")?,
            update_role_id: required(
                d.update_role_id,
                "discord.update_role_id",
                "DISCORD_UPDATE_ROLE_ID",
            )?,
            should_crosspost: d.should_crosspost.unwrap_or(false),
            api_base: d
                .api_base
                .unwrap_or_else(|| crate::discord::DEFAULT_API_BASE.to_string()),
        };

        let s = self.statuspage;
        let statuspage = StatuspageConfig {
            api_key: required(s.api_key, "statuspage.api_key", "STATUSPAGE_API_KEY")?,
            page_id: required(s.page_id, "statuspage.page_id", "STATUSPAGE_PAGE_ID")?,
            api_base: s
                .api_base
                .unwrap_or_else(|| crate::statuspage::DEFAULT_API_BASE.to_string()),
        };

        let server_addr =
            parse_socket_addr(self.server_addr.as_deref().unwrap_or(DEFAULT_SERVER_ADDR))?;

        Ok(Config {
            daemon,
            discord,
            statuspage,
            server_addr,
            state_path: self
                .state_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            json_logs: self.json_logs.unwrap_or(false),
            log_level: self
                .log_level
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

// ─── Value parsers ────────────────────────────────────────────────────────────

fn parse_env<T, F>(get: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    get(name)
        .map(|v| v.trim().parse().map_err(|e| ConfigError::invalid(name, e)))
        .transpose()
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(name, format!("expected a boolean, got {other:?}"))),
    }
}

fn duration_or(
    value: Option<&str>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let duration = match value {
        Some(v) => parse_duration(v).map_err(|e| ConfigError::invalid(name, e))?,
        None => default,
    };
    if duration.is_zero() {
        return Err(ConfigError::invalid(name, "must be greater than zero"));
    }
    Ok(duration)
}

/// Parses `500ms`, `30s`, `5m`, `1h`, or a bare number of seconds.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("expected a duration like 30s, got {value:?}"))?;

    let secs_per_unit = match unit.trim() {
        "ms" => return Ok(Duration::from_millis(amount)),
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        other => return Err(format!("unknown duration unit {other:?}")),
    };
    amount
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration {value:?} is too large"))
}

/// Accepts `host:port` or a bare `:port`, which binds all interfaces.
fn parse_socket_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    let value = value.trim();
    let full = if value.starts_with(':') {
        format!("0.0.0.0{value}")
    } else {
        value.to_string()
    };
    full.parse()
        .map_err(|e| ConfigError::invalid("server_addr", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use ed25519_dalek::SigningKey;

    fn public_key_hex() -> String {
        hex::encode(SigningKey::from_bytes(&[5; 32]).verifying_key().to_bytes())
    }

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DISCORD_TOKEN", "bot-token".to_string()),
            ("DISCORD_PUBLIC_KEY", public_key_hex()),
            ("DISCORD_GUILD_ID", "1".to_string()),
            ("DISCORD_CHANNEL_ID", "2".to_string()),
            ("DISCORD_UPDATE_ROLE_ID", "3".to_string()),
            ("STATUSPAGE_API_KEY", "sp-key".to_string()),
            ("STATUSPAGE_PAGE_ID", "page".to_string()),
        ])
    }

    fn from_map(env: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn env_defaults_apply() {
        let config = from_map(&base_env()).unwrap();

        assert!(config.daemon.enabled);
        assert_eq!(config.daemon.frequency, Duration::from_secs(30));
        assert_eq!(config.daemon.execution_timeout, Duration::from_secs(30 * 60));
        assert!(!config.discord.should_crosspost);
        assert_eq!(config.discord.api_base, crate::discord::DEFAULT_API_BASE);
        assert_eq!(config.statuspage.api_base, crate::statuspage::DEFAULT_API_BASE);
        assert_eq!(config.server_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.state_path, PathBuf::from("data/incidents.json"));
        assert!(!config.json_logs);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn env_overrides_are_parsed() {
        let mut env = base_env();
        env.insert("DAEMON_ENABLED", "false".to_string());
        env.insert("DAEMON_FREQUENCY", "1m".to_string());
        env.insert("DAEMON_EXECUTION_TIMEOUT", "90s".to_string());
        env.insert("DISCORD_SHOULD_CROSSPOST", "true".to_string());
        env.insert("SERVER_ADDR", ":9090".to_string());
        env.insert("JSON_LOGS", "1".to_string());

        let config = from_map(&env).unwrap();
        assert!(!config.daemon.enabled);
        assert_eq!(config.schedule_config().interval, Duration::from_secs(60));
        assert_eq!(config.schedule_config().execution_timeout, Duration::from_secs(90));
        assert!(config.reconciler_config().crosspost);
        assert_eq!(config.reconciler_config().channel_id, ChannelId::new(2));
        assert_eq!(config.server_addr.port(), 9090);
        assert!(config.json_logs);
    }

    #[test]
    fn missing_required_value_names_the_variable() {
        let mut env = base_env();
        env.remove("STATUSPAGE_PAGE_ID");

        let err = from_map(&env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                env: "STATUSPAGE_PAGE_ID",
                ..
            }
        ));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut env = base_env();
        env.insert("DISCORD_TOKEN", "  ".to_string());
        assert!(matches!(
            from_map(&env),
            Err(ConfigError::Missing {
                env: "DISCORD_TOKEN",
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_public_key() {
        let mut env = base_env();
        env.insert("DISCORD_PUBLIC_KEY", "abc".to_string());
        assert!(matches!(from_map(&env), Err(ConfigError::InvalidPublicKey(_))));
    }

    #[test]
    fn rejects_zero_durations() {
        let mut env = base_env();
        env.insert("DAEMON_FREQUENCY", "0s".to_string());
        assert!(matches!(
            from_map(&env),
            Err(ConfigError::InvalidValue {
                name: "daemon.frequency",
                ..
            })
        ));
    }

    #[test]
    fn rejects_non_numeric_ids() {
        let mut env = base_env();
        env.insert("DISCORD_GUILD_ID", "guild".to_string());
        assert!(matches!(
            from_map(&env),
            Err(ConfigError::InvalidValue {
                name: "DISCORD_GUILD_ID",
                ..
            })
        ));
    }

    #[test]
    fn duration_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("45"), Ok(Duration::from_secs(45)));
        assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            format!(
                r#"
state_path = "/var/lib/status-updates/incidents.json"
log_level = "status_updates=debug"

[daemon]
frequency = "10s"

[discord]
token = "t"
public_key = "{}"
guild_id = "100"
channel_id = 200
update_role_id = "300"
should_crosspost = true

[statuspage]
api_key = "k"
page_id = "p"
"#,
                public_key_hex()
            ),
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.daemon.frequency, Duration::from_secs(10));
        assert_eq!(config.discord.guild_id, GuildId::new(100));
        assert_eq!(config.discord.channel_id, ChannelId::new(200));
        assert_eq!(config.discord.update_role_id, RoleId::new(300));
        assert!(config.discord.should_crosspost);
        assert_eq!(config.log_level, "status_updates=debug");
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[discord]\ntokne = \"typo\"\n").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::ParseToml { .. })
        ));
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", from_map(&base_env()).unwrap());
        assert!(!rendered.contains("bot-token"));
        assert!(!rendered.contains("sp-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
