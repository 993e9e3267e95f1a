//! User style overrides layered on top of a resolved theme.
//!
//! Overrides are per-field and optional; [`StyleOverrides::effective`] merges
//! them over a [`ThemeTokens`] set into the flat [`EffectiveStyle`] consumed
//! by layout and paint. The effective style is derived state and is recomputed
//! on every render, never cached.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::theme::ThemeTokens;

/// Default body font stack (matches the preview surface's CSS).
pub const DEFAULT_BODY_FONT: &str =
    "'PingFang SC', -apple-system, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif";

/// Default monospace stack for code.
pub const DEFAULT_CODE_FONT: &str = "'JetBrains Mono', 'Fira Code', monospace";

const HEADING_SCALE_RANGE: (f32, f32) = (0.5, 5.0);
const FONT_SIZE_RANGE: (f32, f32) = (10.0, 40.0);

const DEFAULT_HEADING_SCALES: [f32; 3] = [1.8, 1.5, 1.25];
const DEFAULT_BODY_SIZE: f32 = 15.0;
const DEFAULT_CODE_SIZE: f32 = 14.0;
const DEFAULT_TABLE_SIZE: f32 = 14.0;

/// Heading levels that have an adjustable scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    fn index(self) -> usize {
        match self {
            HeadingLevel::H1 => 0,
            HeadingLevel::H2 => 1,
            HeadingLevel::H3 => 2,
        }
    }
}

/// The user-adjusted visual parameters for the preview surface.
///
/// Color and font fields are free-form strings and are accepted unchecked,
/// matching the reference behavior; numeric fields are range-validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleOverrides {
    heading_scales: [Option<f32>; 3],
    heading_color: Option<String>,
    body_color: Option<String>,
    body_font: Option<String>,
    body_size: Option<f32>,
    code_font: Option<String>,
    code_size: Option<f32>,
    code_background: Option<String>,
    code_color: Option<String>,
    inline_code_background: Option<String>,
    inline_code_color: Option<String>,
    table_font: Option<String>,
    table_size: Option<f32>,
    table_border_color: Option<String>,
    table_header_background: Option<String>,
    table_header_color: Option<String>,
    table_stripe_background: Option<String>,
    background_start: Option<String>,
    background_end: Option<String>,
}

fn check_range(field: &'static str, value: f32, (min, max): (f32, f32)) -> Result<f32> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(Error::InvalidOverrideValue {
            field,
            value,
            min,
            max,
        })
    }
}

impl StyleOverrides {
    pub fn set_heading_scale(&mut self, level: HeadingLevel, scale: f32) -> Result<()> {
        self.heading_scales[level.index()] =
            Some(check_range("heading scale", scale, HEADING_SCALE_RANGE)?);
        Ok(())
    }

    pub fn set_body_size(&mut self, px: f32) -> Result<()> {
        self.body_size = Some(check_range("body size", px, FONT_SIZE_RANGE)?);
        Ok(())
    }

    pub fn set_code_size(&mut self, px: f32) -> Result<()> {
        self.code_size = Some(check_range("code size", px, FONT_SIZE_RANGE)?);
        Ok(())
    }

    pub fn set_table_size(&mut self, px: f32) -> Result<()> {
        self.table_size = Some(check_range("table size", px, FONT_SIZE_RANGE)?);
        Ok(())
    }

    pub fn set_heading_color(&mut self, color: &str) {
        self.heading_color = Some(color.to_string());
    }

    pub fn set_body_color(&mut self, color: &str) {
        self.body_color = Some(color.to_string());
    }

    pub fn set_body_font(&mut self, font: &str) {
        self.body_font = Some(font.to_string());
    }

    pub fn set_code_font(&mut self, font: &str) {
        self.code_font = Some(font.to_string());
    }

    pub fn set_code_background(&mut self, color: &str) {
        self.code_background = Some(color.to_string());
    }

    pub fn set_code_color(&mut self, color: &str) {
        self.code_color = Some(color.to_string());
    }

    pub fn set_inline_code_background(&mut self, color: &str) {
        self.inline_code_background = Some(color.to_string());
    }

    pub fn set_inline_code_color(&mut self, color: &str) {
        self.inline_code_color = Some(color.to_string());
    }

    pub fn set_table_font(&mut self, font: &str) {
        self.table_font = Some(font.to_string());
    }

    pub fn set_table_border_color(&mut self, color: &str) {
        self.table_border_color = Some(color.to_string());
    }

    pub fn set_table_header_background(&mut self, color: &str) {
        self.table_header_background = Some(color.to_string());
    }

    pub fn set_table_header_color(&mut self, color: &str) {
        self.table_header_color = Some(color.to_string());
    }

    pub fn set_table_stripe_background(&mut self, color: &str) {
        self.table_stripe_background = Some(color.to_string());
    }

    pub fn set_background_start(&mut self, color: &str) {
        self.background_start = Some(color.to_string());
    }

    pub fn set_background_end(&mut self, color: &str) {
        self.background_end = Some(color.to_string());
    }

    /// Reset the default-sourced fields to a newly selected theme.
    ///
    /// Overwrites exactly {heading color, body color, background start/end}
    /// and leaves every other override untouched. The reference overwrote
    /// unconditionally on theme change; narrowing it to the default-sourced
    /// fields keeps explicit customizations of unrelated knobs alive.
    pub fn apply_theme(&mut self, tokens: &ThemeTokens) {
        self.heading_color = Some(tokens.title_color.clone());
        self.body_color = Some(tokens.text_color.clone());
        self.background_start = Some(tokens.background.clone());
        self.background_end = Some(tokens.background.clone());
    }

    /// Merge these overrides over a resolved theme. Override wins on conflict.
    pub fn effective(&self, tokens: &ThemeTokens) -> EffectiveStyle {
        let pick = |ovr: &Option<String>, theme: &str| -> String {
            ovr.clone().unwrap_or_else(|| theme.to_string())
        };
        EffectiveStyle {
            heading_scales: [
                self.heading_scales[0].unwrap_or(DEFAULT_HEADING_SCALES[0]),
                self.heading_scales[1].unwrap_or(DEFAULT_HEADING_SCALES[1]),
                self.heading_scales[2].unwrap_or(DEFAULT_HEADING_SCALES[2]),
            ],
            heading_color: pick(&self.heading_color, &tokens.title_color),
            body_color: pick(&self.body_color, &tokens.text_color),
            body_font: pick(&self.body_font, DEFAULT_BODY_FONT),
            body_size: self.body_size.unwrap_or(DEFAULT_BODY_SIZE),
            border_color: tokens.border_color.clone(),
            blockquote_background: tokens.blockquote_background.clone(),
            blockquote_color: tokens.blockquote_color.clone(),
            code_font: pick(&self.code_font, DEFAULT_CODE_FONT),
            code_size: self.code_size.unwrap_or(DEFAULT_CODE_SIZE),
            pre_background: pick(&self.code_background, &tokens.pre_background),
            pre_code_color: pick(&self.code_color, &tokens.pre_code_color),
            inline_code_background: pick(&self.inline_code_background, &tokens.code_background),
            inline_code_color: pick(&self.inline_code_color, &tokens.code_color),
            table_font: pick(&self.table_font, DEFAULT_BODY_FONT),
            table_size: self.table_size.unwrap_or(DEFAULT_TABLE_SIZE),
            table_border_color: pick(&self.table_border_color, &tokens.border_color),
            table_header_background: pick(&self.table_header_background, &tokens.code_background),
            table_header_color: pick(&self.table_header_color, &tokens.title_color),
            table_stripe_background: pick(&self.table_stripe_background, &tokens.blockquote_background),
            background_start: pick(&self.background_start, &tokens.background),
            background_end: pick(&self.background_end, &tokens.background),
            accent_color: tokens.accent_color.clone(),
        }
    }
}

/// The final merged style set consumed by layout, paint, and the emoji pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveStyle {
    pub heading_scales: [f32; 3],
    pub heading_color: String,
    pub body_color: String,
    pub body_font: String,
    pub body_size: f32,
    pub border_color: String,
    pub blockquote_background: String,
    pub blockquote_color: String,
    pub code_font: String,
    pub code_size: f32,
    pub pre_background: String,
    pub pre_code_color: String,
    pub inline_code_background: String,
    pub inline_code_color: String,
    pub table_font: String,
    pub table_size: f32,
    pub table_border_color: String,
    pub table_header_background: String,
    pub table_header_color: String,
    pub table_stripe_background: String,
    pub background_start: String,
    pub background_end: String,
    pub accent_color: String,
}

impl EffectiveStyle {
    /// Whether the background is a vertical gradient rather than a solid fill.
    pub fn is_gradient(&self) -> bool {
        self.background_start != self.background_end
    }

    /// Font size in pixels for a heading level (1-based, clamped to h3).
    pub fn heading_px(&self, level: u8) -> f32 {
        let idx = (level.clamp(1, 3) - 1) as usize;
        self.body_size * self.heading_scales[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    #[test]
    fn numeric_overrides_are_range_checked() {
        let mut ovr = StyleOverrides::default();
        assert!(ovr.set_body_size(15.0).is_ok());
        assert!(matches!(
            ovr.set_body_size(9.0),
            Err(Error::InvalidOverrideValue { .. })
        ));
        assert!(ovr.set_heading_scale(HeadingLevel::H1, 5.1).is_err());
        assert!(ovr.set_heading_scale(HeadingLevel::H1, 0.5).is_ok());
        assert!(ovr.set_code_size(f32::NAN).is_err());
    }

    #[test]
    fn override_wins_over_theme() {
        let tokens = theme::resolve("light");
        let mut ovr = StyleOverrides::default();
        ovr.set_heading_color("#123456");
        let eff = ovr.effective(&tokens);
        assert_eq!(eff.heading_color, "#123456");
        assert_eq!(eff.body_color, tokens.text_color);
    }

    #[test]
    fn theme_switch_overwrites_exactly_the_default_sourced_fields() {
        let mut ovr = StyleOverrides::default();
        ovr.set_heading_color("#111111");
        ovr.set_body_color("#222222");
        ovr.set_code_color("#333333");
        ovr.set_body_size(18.0).unwrap();
        ovr.set_background_start("#aaaaaa");
        ovr.set_background_end("#bbbbbb");

        let dark = theme::resolve("dark");
        ovr.apply_theme(&dark);

        let eff = ovr.effective(&dark);
        assert_eq!(eff.heading_color, dark.title_color);
        assert_eq!(eff.body_color, dark.text_color);
        assert_eq!(eff.background_start, dark.background);
        assert_eq!(eff.background_end, dark.background);
        // customizations of unrelated fields survive the switch
        assert_eq!(eff.pre_code_color, "#333333");
        assert_eq!(eff.body_size, 18.0);
    }

    #[test]
    fn gradient_detection() {
        let tokens = theme::resolve("light");
        let mut ovr = StyleOverrides::default();
        assert!(!ovr.effective(&tokens).is_gradient());
        ovr.set_background_end("#000000");
        assert!(ovr.effective(&tokens).is_gradient());
    }
}
