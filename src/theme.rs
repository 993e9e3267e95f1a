//! Built-in theme palettes and theme resolution.
//!
//! A theme is a fixed set of visual tokens. Resolution is a pure lookup over
//! the built-in table; unknown names fall back to the default theme.

use log::warn;
use serde::{Deserialize, Serialize};

/// The theme used when resolution fails.
pub const DEFAULT_THEME: &str = "light";

/// The full token set for one theme. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeTokens {
    pub background: String,
    pub text_color: String,
    pub title_color: String,
    pub border_color: String,
    pub blockquote_background: String,
    pub blockquote_color: String,
    pub code_background: String,
    pub code_color: String,
    pub pre_background: String,
    pub pre_code_color: String,
    pub accent_color: String,
}

/// Names of all built-in themes, in presentation order.
pub fn builtin_names() -> &'static [&'static str] {
    &[
        "light", "warm", "elegant", "dark", "nature", "sunset", "ocean", "mint",
    ]
}

/// Resolve a theme name to its token set.
///
/// Unknown names log a warning and resolve to [`DEFAULT_THEME`].
pub fn resolve(name: &str) -> ThemeTokens {
    match builtin(name) {
        Some(tokens) => tokens,
        None => {
            warn!("unknown theme '{}', falling back to '{}'", name, DEFAULT_THEME);
            builtin(DEFAULT_THEME).unwrap_or_else(|| unreachable!("default theme must exist"))
        }
    }
}

fn tokens(values: [&str; 11]) -> ThemeTokens {
    let [background, text_color, title_color, border_color, blockquote_background, blockquote_color, code_background, code_color, pre_background, pre_code_color, accent_color] =
        values.map(str::to_string);
    ThemeTokens {
        background,
        text_color,
        title_color,
        border_color,
        blockquote_background,
        blockquote_color,
        code_background,
        code_color,
        pre_background,
        pre_code_color,
        accent_color,
    }
}

fn builtin(name: &str) -> Option<ThemeTokens> {
    let t = match name {
        "light" => tokens([
            "#ffffff", "#2c3e50", "#1a1a1a", "#eaecef", "#f8f9fa", "#4a5568", "#f8fafc",
            "#db2777", "#f8fafc", "#2c3e50", "#3182ce",
        ]),
        "warm" => tokens([
            "#fffaf5", "#4a3c39", "#2d1f1b", "#f0e4d8", "#fff5eb", "#5c4c44", "#fff8f3",
            "#c2410c", "#fff8f3", "#4a3c39", "#dd6b20",
        ]),
        "elegant" => tokens([
            "#f8fafc", "#334155", "#1e293b", "#e2e8f0", "#f1f5f9", "#475569", "#f8fafc",
            "#4f46e5", "#f8fafc", "#334155", "#4f46e5",
        ]),
        "dark" => tokens([
            "#1a1a1a", "#e2e8f0", "#f8fafc", "#2d3748", "#2d3748", "#cbd5e1", "#2d3748",
            "#93c5fd", "#2d3748", "#e2e8f0", "#60a5fa",
        ]),
        "nature" => tokens([
            "#f0f7f4", "#2d3b36", "#1b2b26", "#cce3d8", "#e6f2ec", "#435d54", "#e6f2ec",
            "#0d503c", "#e6f2ec", "#2d3b36", "#2d6a4f",
        ]),
        "sunset" => tokens([
            "#fff9f5", "#4b3c43", "#2b1c23", "#f3d8d3", "#fef2ed", "#6d4c55", "#fef2ed",
            "#c43d54", "#fef2ed", "#4b3c43", "#e85d75",
        ]),
        "ocean" => tokens([
            "#f5f9ff", "#2c4159", "#1a2c43", "#d8e6f6", "#edf3fc", "#456185", "#edf3fc",
            "#0954a5", "#edf3fc", "#2c4159", "#1e88e5",
        ]),
        "mint" => tokens([
            "#f4fbfa", "#2c4a46", "#1a332f", "#d5eeeb", "#e8f7f5", "#427369", "#e8f7f5",
            "#0c8577", "#e8f7f5", "#2c4a46", "#14b8a6",
        ]),
        _ => return None,
    };
    Some(t)
}
