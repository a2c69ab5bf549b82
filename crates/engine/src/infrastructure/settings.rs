//! Environment-driven engine settings.

use std::path::PathBuf;

use sheetwright_domain::{UnknownComponentPolicy, DEFAULT_ROOT_ADDRESS};

pub const LAYOUT_DIR_VAR: &str = "SHEETWRIGHT_LAYOUT_DIR";
pub const ROOT_ADDRESS_VAR: &str = "SHEETWRIGHT_ROOT_ADDRESS";
pub const UNKNOWN_COMPONENTS_VAR: &str = "SHEETWRIGHT_UNKNOWN_COMPONENTS";
pub const EVENT_CAPACITY_VAR: &str = "SHEETWRIGHT_EVENT_CAPACITY";

const DEFAULT_LAYOUT_DIR: &str = "layouts";
const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetwrightSettings {
    /// Directory of the JSON-file layout store.
    pub layout_dir: PathBuf,
    /// Template address of every layout's root component.
    pub root_address: String,
    pub unknown_components: UnknownComponentPolicy,
    /// Buffer of the layout event channel; slow subscribers lag past it.
    pub event_capacity: usize,
}

impl Default for SheetwrightSettings {
    fn default() -> Self {
        Self {
            layout_dir: PathBuf::from(DEFAULT_LAYOUT_DIR),
            root_address: DEFAULT_ROOT_ADDRESS.to_string(),
            unknown_components: UnknownComponentPolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SheetwrightSettings {
    /// Reads settings from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`. Unparseable values are logged and
    /// replaced by their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let unknown_components = match read(UNKNOWN_COMPONENTS_VAR) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    value = %raw,
                    default = %defaults.unknown_components,
                    "Invalid {}, using default",
                    UNKNOWN_COMPONENTS_VAR
                );
                defaults.unknown_components
            }),
            None => defaults.unknown_components,
        };

        let event_capacity = match read(EVENT_CAPACITY_VAR) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => {
                    tracing::warn!(
                        value = %raw,
                        default = defaults.event_capacity,
                        "Invalid {}, using default",
                        EVENT_CAPACITY_VAR
                    );
                    defaults.event_capacity
                }
            },
            None => defaults.event_capacity,
        };

        Self {
            layout_dir: read(LAYOUT_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.layout_dir),
            root_address: read(ROOT_ADDRESS_VAR).unwrap_or(defaults.root_address),
            unknown_components,
            event_capacity,
        }
    }
}
