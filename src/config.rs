use crate::game::constants::{
    BOARD_HEIGHT, BOARD_WIDTH, FRAME_INTERVAL_MS, MIN_FRAME_INTERVAL_MS, STARTING_LENGTH,
};
use crate::game::types::Bounds;
use anyhow::bail;
use std::env;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3012;
const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:3012/ws/";
const MAX_BOARD_SIDE: i32 = 1 << 16;
// A fresh snake has its head at column STARTING_LENGTH and needs one free cell ahead.
const MIN_BOARD_SIDE: i32 = STARTING_LENGTH as i32 + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Client,
    Relay,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub port: u16,
    pub relay_url: String,
    pub bounds: Bounds,
    pub frame_interval: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mode = match var("SNAKE_MODE")
            .map(|value| value.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("") | Some("client") => Mode::Client,
            Some("relay") => Mode::Relay,
            Some(other) => bail!("SNAKE_MODE must be 'client' or 'relay', got '{other}'"),
        };

        let width = board_side("BOARD_WIDTH", var("BOARD_WIDTH"), BOARD_WIDTH)?;
        let height = board_side("BOARD_HEIGHT", var("BOARD_HEIGHT"), BOARD_HEIGHT)?;
        let frame_ms = var("FRAME_INTERVAL_MS")
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(FRAME_INTERVAL_MS)
            .max(MIN_FRAME_INTERVAL_MS);

        Ok(Self {
            mode,
            port: var("PORT")
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            relay_url: var("RELAY_URL")
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_RELAY_URL.to_string()),
            bounds: Bounds { width, height },
            frame_interval: Duration::from_millis(frame_ms),
        })
    }
}

fn board_side(name: &str, raw: Option<String>, default: i32) -> anyhow::Result<i32> {
    let Some(side) = raw.and_then(|value| value.trim().parse::<i32>().ok()) else {
        return Ok(default);
    };
    if !(MIN_BOARD_SIDE..=MAX_BOARD_SIDE).contains(&side) {
        bail!("{name} must be between {MIN_BOARD_SIDE} and {MAX_BOARD_SIDE}, got {side}");
    }
    Ok(side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_describe_a_local_client() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.mode, Mode::Client);
        assert_eq!(config.port, 3012);
        assert_eq!(config.relay_url, "ws://127.0.0.1:3012/ws/");
        assert_eq!(
            config.bounds,
            Bounds {
                width: 40,
                height: 40
            }
        );
        assert_eq!(config.frame_interval, Duration::from_millis(100));
    }

    #[test]
    fn relay_mode_and_overrides() {
        let config = config_from(&[
            ("SNAKE_MODE", "Relay"),
            ("PORT", "9000"),
            ("BOARD_WIDTH", "64"),
            ("BOARD_HEIGHT", "not-a-number"),
            ("FRAME_INTERVAL_MS", "5"),
        ])
        .unwrap();
        assert_eq!(config.mode, Mode::Relay);
        assert_eq!(config.port, 9000);
        assert_eq!(config.bounds.width, 64);
        assert_eq!(config.bounds.height, 40);
        assert_eq!(config.frame_interval, Duration::from_millis(20));
    }

    #[test]
    fn boards_too_small_for_a_spawned_snake_are_rejected() {
        let error = config_from(&[("BOARD_WIDTH", "4")]).expect_err("narrow board");
        assert!(error.to_string().contains("BOARD_WIDTH"));

        let error = config_from(&[("BOARD_HEIGHT", "0")]).expect_err("empty board");
        assert!(error.to_string().contains("BOARD_HEIGHT"));

        let config = config_from(&[("BOARD_WIDTH", "6"), ("BOARD_HEIGHT", "6")]).unwrap();
        assert_eq!(
            config.bounds,
            Bounds {
                width: 6,
                height: 6
            }
        );
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let error = config_from(&[("SNAKE_MODE", "spectator")]).expect_err("bad mode");
        assert!(error.to_string().contains("spectator"));
    }
}
