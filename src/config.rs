use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum and maximum Opus bitrate accepted by the `bitrate` command, kbps.
pub const BITRATE_RANGE: (u32, u32) = (8, 192);
/// Range accepted by the `packet-passes` command.
pub const PASSES_RANGE: (u8, u8) = (1, 5);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub command_prefix: String,
    pub log_channel_id: Option<u64>,
    pub reply_to_unknown_commands: bool,

    // Audio
    pub max_queue_size: usize,
    pub default_bitrate: u32,
    pub default_volume: f32,
    pub default_passes: u8,

    // Proceso
    pub freeze_guard_ms: u64,
    pub app_env: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, `load` uses the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let config = Self {
            // Discord
            discord_token: lookup("DISCORD_TOKEN")
                .ok_or_else(|| anyhow::anyhow!("DISCORD_TOKEN no está definido"))?,
            command_prefix: var("COMMAND_PREFIX", "!"),
            log_channel_id: match lookup("LOG_CHANNEL_ID") {
                Some(val) if !val.trim().is_empty() => Some(val.trim().parse()?),
                _ => None,
            },
            reply_to_unknown_commands: var("REPLY_TO_UNKNOWN_COMMANDS", "true").parse()?,

            // Audio
            max_queue_size: var("MAX_QUEUE_SIZE", "20").parse()?,
            default_bitrate: var("DEFAULT_BITRATE", "128").parse()?,
            default_volume: var("DEFAULT_VOLUME", "1.0").parse()?,
            default_passes: var("DEFAULT_PASSES", "1").parse()?,

            // Proceso
            freeze_guard_ms: var("FREEZE_GUARD_MS", "30000").parse()?,
            app_env: var("APP_ENV", "development"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Token and command prefix must not be empty
    /// - Volume must be between 0.0 and 1.0
    /// - Bitrate and packet passes must fit the ranges the commands accept
    /// - Queue size and freeze threshold must be greater than 0
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("DISCORD_TOKEN must not be empty");
        }

        if self.command_prefix.is_empty() || self.command_prefix.chars().any(char::is_whitespace) {
            anyhow::bail!("Command prefix must be non-empty and without whitespace, got: {:?}", self.command_prefix);
        }

        if !(0.0..=1.0).contains(&self.default_volume) {
            anyhow::bail!("Default volume must be between 0.0 and 1.0, got: {}", self.default_volume);
        }

        let (min_bitrate, max_bitrate) = BITRATE_RANGE;
        if !(min_bitrate..=max_bitrate).contains(&self.default_bitrate) {
            anyhow::bail!(
                "Default bitrate must be between {} and {} kbps, got: {}",
                min_bitrate,
                max_bitrate,
                self.default_bitrate
            );
        }

        let (min_passes, max_passes) = PASSES_RANGE;
        if !(min_passes..=max_passes).contains(&self.default_passes) {
            anyhow::bail!(
                "Default packet passes must be between {} and {}, got: {}",
                min_passes,
                max_passes,
                self.default_passes
            );
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if self.freeze_guard_ms == 0 {
            anyhow::bail!("Freeze guard threshold must be greater than 0");
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn freeze_threshold(&self) -> Duration {
        Duration::from_millis(self.freeze_guard_ms)
    }

    /// Returns a summary of the current configuration for logging, without
    /// the token.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: prefix {:?}, log channel {}, unknown command replies={}\n  \
            Audio: queue {} tracks, {}kbps, {}% vol, {} passes\n  \
            Process: env {}, freeze guard {}ms",
            self.command_prefix,
            self.log_channel_id
                .map_or("none".to_string(), |id| id.to_string()),
            self.reply_to_unknown_commands,
            self.max_queue_size,
            self.default_bitrate,
            (self.default_volume * 100.0).round() as u32,
            self.default_passes,
            self.app_env,
            self.freeze_guard_ms
        )
    }
}
