use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Light,
    Dark,
}

impl ThemeName {
    pub fn toggled(self) -> Self {
        match self {
            ThemeName::Light => ThemeName::Dark,
            ThemeName::Dark => ThemeName::Light,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ThemeName::Light => "Light",
            ThemeName::Dark => "Dark",
        }
    }
}

/// Stored preference wins; otherwise follow the system colour scheme.
pub fn resolve_theme(stored: Option<ThemeName>, prefers_dark: bool) -> ThemeName {
    stored.unwrap_or(if prefers_dark {
        ThemeName::Dark
    } else {
        ThemeName::Light
    })
}

/// System colour-scheme hint. The config override wins, then `COLORFGBG`.
pub fn system_prefers_dark(config_override: Option<bool>) -> bool {
    if let Some(prefers_dark) = config_override {
        return prefers_dark;
    }
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| prefers_dark_from_colorfgbg(&value))
        .unwrap_or(false)
}

/// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`); ANSI backgrounds 0-6 and
/// 8 are dark.
pub fn prefers_dark_from_colorfgbg(value: &str) -> Option<bool> {
    let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    Some(matches!(background, 0..=6 | 8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn stored_theme_overrides_system_preference() {
        assert_eq!(resolve_theme(Some(ThemeName::Light), true), ThemeName::Light);
        assert_eq!(resolve_theme(None, true), ThemeName::Dark);
        assert_eq!(resolve_theme(None, false), ThemeName::Light);
    }

    #[test]
    fn names_round_trip_as_lowercase() {
        assert_eq!(ThemeName::Dark.to_string(), "dark");
        assert_eq!(ThemeName::from_str("light").ok(), Some(ThemeName::Light));
        assert!(ThemeName::from_str("solarized").is_err());
        assert_eq!(ThemeName::Dark.toggled(), ThemeName::Light);
    }

    #[test]
    fn colorfgbg_background_decides_darkness() {
        assert_eq!(prefers_dark_from_colorfgbg("15;0"), Some(true));
        assert_eq!(prefers_dark_from_colorfgbg("0;15"), Some(false));
        assert_eq!(prefers_dark_from_colorfgbg("15;default;8"), Some(true));
        assert_eq!(prefers_dark_from_colorfgbg("garbage"), None);
    }

    #[test]
    fn config_override_skips_detection() {
        assert!(system_prefers_dark(Some(true)));
        assert!(!system_prefers_dark(Some(false)));
    }
}
