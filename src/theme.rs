//! Theme preference record and its resolution against the terminal background.

use crate::fields::ThemeMode;
use crate::storage::{KeyValueStore, THEME_KEY};

/// Concrete palette after `system` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTheme {
    Light,
    Dark,
}

/// Read the stored preference. Missing, unreadable or unknown values read as `system`.
pub fn load(store: &impl KeyValueStore) -> ThemeMode {
    let raw = match store.get(THEME_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return ThemeMode::System,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read theme preference");
            return ThemeMode::System;
        }
    };
    let value = serde_json::from_str::<String>(&raw).unwrap_or(raw);
    ThemeMode::parse(&value).unwrap_or_default()
}

pub fn save(store: &mut impl KeyValueStore, mode: ThemeMode) {
    let data = format!("\"{}\"", mode.as_str());
    match store.set(THEME_KEY, &data) {
        Ok(()) => tracing::info!(theme = mode.as_str(), "theme preference saved"),
        Err(e) => tracing::warn!(error = %e, "failed to persist theme preference"),
    }
}

pub fn resolve(mode: ThemeMode, prefers_dark: bool) -> ResolvedTheme {
    match mode {
        ThemeMode::Light => ResolvedTheme::Light,
        ThemeMode::Dark => ResolvedTheme::Dark,
        ThemeMode::System if prefers_dark => ResolvedTheme::Dark,
        ThemeMode::System => ResolvedTheme::Light,
    }
}

/// Dark-mode signal from `COLORFGBG` ("fg;bg" or "fg;default;bg").
/// Terminals that do not set it are treated as dark.
pub fn system_prefers_dark() -> bool {
    match std::env::var("COLORFGBG") {
        Ok(value) => background_is_dark(&value).unwrap_or(true),
        Err(_) => true,
    }
}

fn background_is_dark(colorfgbg: &str) -> Option<bool> {
    let bg: u8 = colorfgbg.rsplit(';').next()?.trim().parse().ok()?;
    Some(matches!(bg, 0..=6 | 8))
}
