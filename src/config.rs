//! Device description loading and shape validation. The TOML config is
//! deserialized into raw serde types, then validated into a typed
//! `DeviceConfig`; kind-specific rules live in the component registry.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::diagnostics::GenError;
use crate::span::{Span, Spanned};

/// Target board for the generated firmware source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Board {
    Esp32,
    Esp8266,
    Rp2040,
    Host,
}

impl Board {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "esp32" => Some(Self::Esp32),
            "esp8266" => Some(Self::Esp8266),
            "rp2040" => Some(Self::Rp2040),
            "host" => Some(Self::Host),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Esp32 => "esp32",
            Self::Esp8266 => "esp8266",
            Self::Rp2040 => "rp2040",
            Self::Host => "host",
        }
    }

    /// Highest usable GPIO number.
    pub fn max_gpio(self) -> u32 {
        match self {
            Self::Esp32 => 39,
            Self::Esp8266 => 17,
            Self::Rp2040 => 29,
            Self::Host => u32::MAX,
        }
    }

    /// Pins wired to the ADC peripheral.
    pub fn is_adc_pin(self, pin: u32) -> bool {
        match self {
            Self::Esp32 => (32..=39).contains(&pin),
            Self::Esp8266 => pin == 17, // A0
            Self::Rp2040 => (26..=29).contains(&pin),
            Self::Host => false,
        }
    }

    pub fn supports_adc(self) -> bool {
        !matches!(self, Self::Host)
    }

    /// Preprocessor define emitted into the generated source.
    pub fn define(self) -> &'static str {
        match self {
            Self::Esp32 => "EMBER_BOARD_ESP32",
            Self::Esp8266 => "EMBER_BOARD_ESP8266",
            Self::Rp2040 => "EMBER_BOARD_RP2040",
            Self::Host => "EMBER_BOARD_HOST",
        }
    }
}

/// One validated component instance from the config.
#[derive(Debug, Clone)]
pub struct Component {
    pub kind: String,
    pub id: String,
    pub pin: Option<u32>,
    pub inverted: bool,
    pub update_interval_ms: Option<u64>,
    pub interval_ms: Option<u64>,
    pub lambda: Option<Spanned<String>>,
    pub then: Option<Spanned<String>>,
    pub baud_rate: Option<u32>,
    /// Config-level value type for template sensors (`float` default).
    pub value_type: Option<String>,
}

/// The full validated device description.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub name: String,
    pub board: Board,
    pub components: Vec<Component>,
}

// ---- TOML deserialization types ----

#[derive(Deserialize)]
struct TomlConfig {
    device: Option<TomlDevice>,
    #[serde(default, rename = "component")]
    components: Vec<TomlComponent>,
}

#[derive(Deserialize)]
struct TomlDevice {
    name: Option<String>,
    board: Option<String>,
}

#[derive(Deserialize)]
struct TomlComponent {
    kind: Option<String>,
    id: Option<String>,
    pin: Option<u32>,
    inverted: Option<bool>,
    update_interval: Option<String>,
    interval: Option<String>,
    lambda: Option<toml::Spanned<String>>,
    then: Option<toml::Spanned<String>>,
    baud_rate: Option<u32>,
    #[serde(rename = "type")]
    value_type: Option<String>,
}

// ---- Duration parsing ----

/// Parse `"250ms" | "30s" | "5min" | "2h"` into milliseconds.
pub fn parse_duration_ms(text: &str) -> Option<u64> {
    let text = text.trim();
    let split = text.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = text.split_at(split);
    let value: u64 = digits.parse().ok()?;
    match unit {
        "ms" => Some(value),
        "s" => value.checked_mul(1_000),
        "min" => value.checked_mul(60_000),
        "h" => value.checked_mul(3_600_000),
        _ => None,
    }
}

// ---- Identifier validation ----

/// Config ids must be valid identifiers as written: they become C++
/// globals and `id(...)` reference targets verbatim.
fn validate_component_id(id: &str) -> Result<(), String> {
    let valid = !id.is_empty()
        && {
            let first = id.chars().next().unwrap();
            first.is_ascii_alphabetic() || first == '_'
        }
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid {
        return Err(format!("component id '{id}' is not a valid identifier"));
    }
    if crate::codegen::expr::sanitize_ident(id) != id {
        return Err(format!("component id '{id}' collides with a C++ reserved word"));
    }
    Ok(())
}

// ---- Loading & validation ----

/// Read and validate a device description file.
pub fn load(path: &Path) -> Result<(String, DeviceConfig), GenError> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        GenError::config(format!("could not read file: {e}"), path.to_path_buf())
    })?;
    let config = parse(&source, path)?;
    Ok((source, config))
}

/// Parse and validate a device description from source text.
pub fn parse(source: &str, origin: &Path) -> Result<DeviceConfig, GenError> {
    let raw: TomlConfig = toml::from_str(source).map_err(|e| {
        GenError::config(format!("invalid syntax: {}", e.message()), origin.to_path_buf())
    })?;

    let device = raw.device.ok_or_else(|| {
        GenError::config("missing [device] section", origin.to_path_buf())
    })?;

    let name = device
        .name
        .ok_or_else(|| GenError::config("missing 'name' in [device]", origin.to_path_buf()))?;
    if name.trim().is_empty() {
        return Err(GenError::config(
            "device name must not be empty",
            origin.to_path_buf(),
        ));
    }

    let board_name = device
        .board
        .ok_or_else(|| GenError::config("missing 'board' in [device]", origin.to_path_buf()))?;
    let board = Board::parse(&board_name).ok_or_else(|| {
        GenError::validation(format!(
            "unknown board '{board_name}'; expected 'esp32', 'esp8266', 'rp2040', or 'host'"
        ))
    })?;

    let mut components = Vec::with_capacity(raw.components.len());
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut anonymous_counters: HashMap<String, usize> = HashMap::new();

    for (index, raw_component) in raw.components.into_iter().enumerate() {
        let kind = raw_component.kind.ok_or_else(|| {
            GenError::validation(format!("component #{index}: missing 'kind'"))
        })?;

        let id = match raw_component.id {
            Some(id) => {
                validate_component_id(&id).map_err(GenError::validation)?;
                id
            }
            None => {
                // Components without explicit ids get generated, per-kind ones.
                let counter = anonymous_counters.entry(kind.clone()).or_insert(0);
                let generated = format!("{}_{counter}", kind.replace('.', "_"));
                *counter += 1;
                generated
            }
        };
        if !seen_ids.insert(id.clone()) {
            return Err(GenError::validation(format!("duplicate component id '{id}'")));
        }

        if let Some(pin) = raw_component.pin {
            if pin > board.max_gpio() {
                return Err(GenError::validation(format!(
                    "component '{id}': pin {pin} is out of range for board '{}' (max GPIO {})",
                    board.name(),
                    board.max_gpio(),
                )));
            }
        }

        let update_interval_ms = parse_interval(&id, "update_interval", raw_component.update_interval)?;
        let interval_ms = parse_interval(&id, "interval", raw_component.interval)?;

        components.push(Component {
            kind,
            id,
            pin: raw_component.pin,
            inverted: raw_component.inverted.unwrap_or(false),
            update_interval_ms,
            interval_ms,
            lambda: raw_component.lambda.map(into_spanned),
            then: raw_component.then.map(into_spanned),
            baud_rate: raw_component.baud_rate,
            value_type: raw_component.value_type,
        });
    }

    Ok(DeviceConfig { name, board, components })
}

fn parse_interval(
    id: &str,
    field: &str,
    value: Option<String>,
) -> Result<Option<u64>, GenError> {
    match value {
        None => Ok(None),
        Some(text) => parse_duration_ms(&text).map(Some).ok_or_else(|| {
            GenError::validation(format!(
                "component '{id}': invalid {field} '{text}'; expected a duration like '250ms', '30s', or '5min'"
            ))
        }),
    }
}

fn into_spanned(spanned: toml::Spanned<String>) -> Spanned<String> {
    let range = spanned.span();
    Spanned::new(spanned.into_inner(), Span::new(range.start, range.end))
}
