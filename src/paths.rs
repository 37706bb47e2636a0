//! Centralized path definitions for configuration files.
//!
//! Functions accept `&Path` so they work both from the CLI and from a host
//! application that supplies its own config directory.

use std::path::{Path, PathBuf};

// ── Application identity ─────────────────────────────────────────

pub const APP_ID: &str = "schematic-agent";

// ── Leaf filenames ───────────────────────────────────────────────

pub const SETTINGS_FILE: &str = "settings.json";

/// Extension used for schematic documents written by the CLI.
pub const SCHEMATIC_EXTENSION: &str = "sch.json";

// ── Config-dir functions (take app_config_dir) ───────────────────

pub fn settings_path(app_config_dir: &Path) -> PathBuf {
    app_config_dir.join(SETTINGS_FILE)
}

/// Platform config directory for the application:
/// `%APPDATA%`, `~/Library/Application Support` or `$XDG_CONFIG_HOME`
/// (falling back to `~/.config`), each joined with [`APP_ID`].
pub fn config_dir() -> PathBuf {
    let base = if cfg!(target_os = "windows") {
        std::env::var("APPDATA")
            .map_or_else(|_| PathBuf::from("C:\\Users\\Default\\AppData\\Roaming"), PathBuf::from)
    } else if cfg!(target_os = "macos") {
        home_dir().join("Library/Application Support")
    } else {
        std::env::var("XDG_CONFIG_HOME").map_or_else(|_| home_dir().join(".config"), PathBuf::from)
    };
    base.join(APP_ID)
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_or_else(|_| PathBuf::from("."), PathBuf::from)
}
