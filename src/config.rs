//! Configuration loading and parsing.
//!
//! Mirrors the teacher's hex-string-plus-accessor convention: fields
//! that look like addresses are stored as `String` in the TOML so they
//! read naturally as `0x...`, with a `_val()` method doing the parse.

use serde::Deserialize;

const DEFAULT_LOAD_BASE: u32 = 0x0000_0000;
const DEFAULT_MAX_CYCLES: u64 = 1_000_000;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub trace: bool,

    #[serde(default = "default_load_base")]
    pub load_base: String,

    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,
}

impl GeneralConfig {
    pub fn load_base_val(&self) -> u32 {
        parse_hex32(&self.load_base, DEFAULT_LOAD_BASE)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace: false,
            load_base: default_load_base(),
            max_cycles: default_max_cycles(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct MemoryConfig {
    #[serde(default = "default_timer_target_ms")]
    pub timer_target_ms: u32,
}

fn parse_hex32(s: &str, default: u32) -> u32 {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(s, 16).unwrap_or(default)
}

fn default_load_base() -> String {
    format!("{:#x}", DEFAULT_LOAD_BASE)
}

fn default_max_cycles() -> u64 {
    DEFAULT_MAX_CYCLES
}

fn default_timer_target_ms() -> u32 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &std::path::Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        toml::from_str(&text).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_load_base_is_zero() {
        let cfg = Config::default();
        assert_eq!(cfg.general.load_base_val(), 0);
    }

    #[test]
    fn hex_load_base_parses() {
        let general = GeneralConfig {
            trace: false,
            load_base: "0x1000".to_string(),
            max_cycles: 10,
        };
        assert_eq!(general.load_base_val(), 0x1000);
    }
}
