use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    #[serde(rename = "Claro")]
    Light,
    #[serde(rename = "Oscuro")]
    Dark,
}

pub const THEME_OPTIONS: &[&str] = &["Claro", "Oscuro"];

impl Theme {
    /// The literal option string presented to the user.
    pub fn option(&self) -> &'static str {
        match self {
            Self::Light => "Claro",
            Self::Dark => "Oscuro",
        }
    }

    pub fn from_option(option: &str) -> Option<Self> {
        match option {
            "Claro" => Some(Self::Light),
            "Oscuro" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Self::Dark)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.option())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::from_option(s)
            .or_else(|| match s.to_lowercase().as_str() {
                "light" | "claro" => Some(Theme::Light),
                "dark" | "oscuro" => Some(Theme::Dark),
                _ => None,
            })
            .ok_or_else(|| {
                format!(
                    "unknown theme '{s}' (expected {})",
                    THEME_OPTIONS.join(" or ")
                )
            })
    }
}

/// Rendering colors for one theme, as `#rrggbb` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub background: &'static str,
    pub text: &'static str,
    pub grid: &'static str,
    pub positive: &'static str,
    pub negative: &'static str,
}

const LIGHT: Palette = Palette {
    primary: "#1f77b4",
    secondary: "#ff7f0e",
    background: "#ffffff",
    text: "#000000",
    grid: "#e5e5e5",
    positive: "#2ca02c",
    negative: "#d62728",
};

const DARK: Palette = Palette {
    primary: "#4fa3e0",
    secondary: "#ffa64d",
    background: "#111111",
    text: "#ffffff",
    grid: "#333333",
    positive: "#3fb68b",
    negative: "#f0635c",
};

pub fn resolve(theme: Theme) -> Palette {
    match theme {
        Theme::Light => LIGHT,
        Theme::Dark => DARK,
    }
}

/// Parse `#rrggbb` into its components.
pub fn hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let h = hex.strip_prefix('#')?;
    if h.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&h[0..2], 16).ok()?;
    let g = u8::from_str_radix(&h[2..4], 16).ok()?;
    let b = u8::from_str_radix(&h[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Page stylesheet for the HTML report.
pub fn stylesheet(theme: Theme) -> String {
    let p = resolve(theme);
    let (button_bg, card_bg) = match theme {
        Theme::Light => ("#eeeeee", "#f7f7f7"),
        Theme::Dark => ("#222222", "#1b1b1b"),
    };
    format!(
        "body {{ background-color: {bg}; color: {text}; font-family: system-ui, sans-serif; margin: 0; padding: 24px; }}
h1, h2 {{ color: {text}; }}
.button {{ background-color: {button_bg}; color: {text}; border-radius: 8px; padding: 6px 14px; text-decoration: none; }}
.metrics {{ display: grid; grid-template-columns: repeat(4, 1fr); gap: 16px; }}
.metric {{ background-color: {card_bg}; border-radius: 8px; padding: 12px 16px; }}
.metric .label {{ font-size: 13px; opacity: 0.75; }}
.metric .value {{ font-size: 24px; font-weight: 600; }}
.trend-up {{ color: {positive}; }}
.trend-down {{ color: {negative}; }}
.notice {{ background-color: {card_bg}; border-radius: 8px; padding: 12px 16px; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border-bottom: 1px solid {grid}; padding: 4px 8px; text-align: left; }}
td.num {{ text-align: right; }}
svg {{ background-color: {bg}; }}
",
        bg = p.background,
        text = p.text,
        grid = p.grid,
        positive = p.positive,
        negative = p.negative,
    )
}
