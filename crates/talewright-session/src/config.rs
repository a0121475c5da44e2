//! Session configuration read from the environment.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

pub const ROUTER_TIMEOUT_MS: &str = "TALEWRIGHT_ROUTER_TIMEOUT_MS";
pub const NARRATOR_TIMEOUT_MS: &str = "TALEWRIGHT_NARRATOR_TIMEOUT_MS";
pub const PLAYER_ROLLS_ATTACKS: &str = "TALEWRIGHT_PLAYER_ROLLS_ATTACKS";
pub const DEFAULT_PLAYER_HP: &str = "TALEWRIGHT_DEFAULT_PLAYER_HP";
pub const DEFAULT_ENEMY_HP: &str = "TALEWRIGHT_DEFAULT_ENEMY_HP";
pub const RNG_SEED: &str = "TALEWRIGHT_RNG_SEED";
pub const LOG_FORMAT: &str = "TALEWRIGHT_LOG_FORMAT";

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format {other:?}, expected json or pretty")),
        }
    }
}

/// Tunables for a `TurnService`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time budget for the generative intent router.
    pub router_timeout: Duration,
    /// Time budget for the narration collaborator.
    pub narrator_timeout: Duration,
    /// Attacks without a supplied roll open an attack check instead of
    /// rolling for the player.
    pub player_rolls_attacks: bool,
    /// Player HP when a battle starts without a snapshot.
    pub default_player_hp: i32,
    /// HP of enemies created from scene participants.
    pub default_enemy_hp: i32,
    /// Seed for the dice source; OS-seeded when unset.
    pub rng_seed: Option<u64>,
    pub log_format: LogFormat,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            router_timeout: Duration::from_millis(4000),
            narrator_timeout: Duration::from_millis(8000),
            player_rolls_attacks: true,
            default_player_hp: 20,
            default_enemy_hp: 10,
            rng_seed: None,
            log_format: LogFormat::Json,
        }
    }
}

impl SessionConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first invalid variable.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`; unset or blank variables
    /// keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first invalid variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let router_timeout = match get(ROUTER_TIMEOUT_MS) {
            Some(raw) => Duration::from_millis(parse(ROUTER_TIMEOUT_MS, &raw)?),
            None => defaults.router_timeout,
        };
        let narrator_timeout = match get(NARRATOR_TIMEOUT_MS) {
            Some(raw) => Duration::from_millis(parse(NARRATOR_TIMEOUT_MS, &raw)?),
            None => defaults.narrator_timeout,
        };
        let player_rolls_attacks = match get(PLAYER_ROLLS_ATTACKS) {
            Some(raw) => parse_flag(PLAYER_ROLLS_ATTACKS, &raw)?,
            None => defaults.player_rolls_attacks,
        };
        let default_player_hp = match get(DEFAULT_PLAYER_HP) {
            Some(raw) => parse_hp(DEFAULT_PLAYER_HP, &raw)?,
            None => defaults.default_player_hp,
        };
        let default_enemy_hp = match get(DEFAULT_ENEMY_HP) {
            Some(raw) => parse_hp(DEFAULT_ENEMY_HP, &raw)?,
            None => defaults.default_enemy_hp,
        };
        let rng_seed = get(RNG_SEED).map(|raw| parse(RNG_SEED, &raw)).transpose()?;
        let log_format = match get(LOG_FORMAT) {
            Some(raw) => parse(LOG_FORMAT, &raw)?,
            None => defaults.log_format,
        };

        Ok(Self {
            router_timeout,
            narrator_timeout,
            player_rolls_attacks,
            default_player_hp,
            default_enemy_hp,
            rng_seed,
            log_format,
        })
    }
}

fn parse<T>(name: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{name} is invalid: {e}")))
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!(
            "{name} must be true or false, got {other:?}"
        ))),
    }
}

fn parse_hp(name: &str, raw: &str) -> Result<i32, AppError> {
    let hp: i32 = parse(name, raw)?;
    if hp <= 0 {
        return Err(AppError::Config(format!("{name} must be positive, got {hp}")));
    }
    Ok(hp)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<SessionConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        SessionConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        assert_eq!(config_from(&[]).unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_every_variable_is_read() {
        let config = config_from(&[
            (ROUTER_TIMEOUT_MS, "250"),
            (NARRATOR_TIMEOUT_MS, "500"),
            (PLAYER_ROLLS_ATTACKS, "false"),
            (DEFAULT_PLAYER_HP, "30"),
            (DEFAULT_ENEMY_HP, "7"),
            (RNG_SEED, "42"),
            (LOG_FORMAT, "Pretty"),
        ])
        .unwrap();

        assert_eq!(config.router_timeout, Duration::from_millis(250));
        assert_eq!(config.narrator_timeout, Duration::from_millis(500));
        assert!(!config.player_rolls_attacks);
        assert_eq!(config.default_player_hp, 30);
        assert_eq!(config.default_enemy_hp, 7);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = config_from(&[(RNG_SEED, "  "), (DEFAULT_PLAYER_HP, "")]).unwrap();
        assert_eq!(config.rng_seed, None);
        assert_eq!(config.default_player_hp, 20);
    }

    // --- invalid values ---

    #[test]
    fn test_invalid_number_names_the_variable() {
        let err = config_from(&[(ROUTER_TIMEOUT_MS, "soon")]).unwrap_err();
        assert!(err.to_string().contains(ROUTER_TIMEOUT_MS));
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let err = config_from(&[(PLAYER_ROLLS_ATTACKS, "maybe")]).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains(PLAYER_ROLLS_ATTACKS)));
    }

    #[test]
    fn test_non_positive_hp_is_rejected() {
        assert!(config_from(&[(DEFAULT_ENEMY_HP, "0")]).is_err());
        assert!(config_from(&[(DEFAULT_PLAYER_HP, "-5")]).is_err());
    }

    #[test]
    fn test_unknown_log_format_is_rejected() {
        let err = config_from(&[(LOG_FORMAT, "xml")]).unwrap_err();
        assert!(err.to_string().contains(LOG_FORMAT));
    }
}
