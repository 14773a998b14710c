//! Line-based TOML subset parser
//!
//! Handles only what `display.toml` needs:
//! - `[section]` headers (`panel`, `refresh`, `touch`, `loop`)
//! - `key = value` with integers, booleans and basic (`"..."`) or literal
//!   (`'...'`) strings without escapes
//! - `#` comments, whole-line or trailing
//!
//! Arrays, inline tables, multi-line strings and dotted keys are not
//! supported. The build script checks the file with a full TOML parser, so
//! this one can stay small.

use core::str::FromStr;

use heapless::String;

use super::types::{ConfigError, DisplayConfig};
use crate::panel::PanelKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Panel,
    Refresh,
    Touch,
    Loop,
}

/// Parse configuration text, then validate it
pub fn parse_config(input: &str) -> Result<DisplayConfig, ConfigError> {
    let mut config = DisplayConfig::new();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            section = parse_section_header(line)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ConfigError::InvalidValue)?;
        apply_value(&mut config, section, key, value)?;
    }

    config.validate()?;
    Ok(config)
}

fn parse_section_header(line: &str) -> Result<Section, ConfigError> {
    let header = strip_comment(line)
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or(ConfigError::InvalidSection)?;

    match header.trim() {
        "panel" => Ok(Section::Panel),
        "refresh" => Ok(Section::Refresh),
        "touch" => Ok(Section::Touch),
        "loop" => Ok(Section::Loop),
        _ => Err(ConfigError::InvalidSection),
    }
}

fn apply_value(
    config: &mut DisplayConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    match (section, key) {
        (Section::Root, "name") => {
            config.name =
                String::try_from(parse_string(value)?).map_err(|_| ConfigError::InvalidValue)?;
        }

        (Section::Panel, "kind") => config.panel.kind = parse_kind(value)?,
        (Section::Panel, "width") => config.panel.width = parse_int(value)?,
        (Section::Panel, "height") => config.panel.height = parse_int(value)?,
        (Section::Panel, "buffer_divisor") => config.panel.buffer_divisor = parse_int(value)?,
        (Section::Panel, "double_buffer") => config.panel.double_buffer = parse_bool(value)?,
        (Section::Panel, "threshold") => config.panel.threshold = parse_int(value)?,

        (Section::Refresh, "min_interval_ms") => config.refresh.min_interval_ms = parse_int(value)?,
        (Section::Refresh, "sleep_when_idle") => {
            config.refresh.sleep_when_idle = parse_bool(value)?
        }

        (Section::Touch, "enabled") => config.touch.enabled = parse_bool(value)?,
        (Section::Touch, "min_x") => config.touch.min_x = parse_int(value)?,
        (Section::Touch, "max_x") => config.touch.max_x = parse_int(value)?,
        (Section::Touch, "min_y") => config.touch.min_y = parse_int(value)?,
        (Section::Touch, "max_y") => config.touch.max_y = parse_int(value)?,

        (Section::Loop, "tick_ms") => config.loop_.tick_ms = parse_int(value)?,

        _ => return Err(ConfigError::UnknownKey),
    }
    Ok(())
}

/// Split `key = value`, dropping a trailing comment outside quotes
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = strip_comment(&line[eq_pos + 1..]);

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Cut at the first `#` outside a quoted string, then trim
fn strip_comment(text: &str) -> &str {
    let mut quote = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (None, '#') => return text[..i].trim(),
            (None, '"' | '\'') => quote = Some(c),
            (Some(open), _) if c == open => quote = None,
            _ => {}
        }
    }
    text.trim()
}

/// Quoted string body; basic strings may not use escapes
fn parse_string(value: &str) -> Result<&str, ConfigError> {
    let literal = value
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .filter(|inner| !inner.contains('\''));
    let basic = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .filter(|inner| !inner.contains(['"', '\\']));
    literal.or(basic).ok_or(ConfigError::InvalidValue)
}

/// Parse an integer, allowing TOML `_` digit separators
fn parse_int<T: FromStr>(value: &str) -> Result<T, ConfigError> {
    let mut digits: String<16> = String::new();
    for c in value.chars().filter(|c| *c != '_') {
        digits.push(c).map_err(|_| ConfigError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ConfigError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue),
    }
}

fn parse_kind(value: &str) -> Result<PanelKind, ConfigError> {
    match parse_string(value)? {
        "raster" => Ok(PanelKind::Raster),
        "mono" => Ok(PanelKind::Mono),
        _ => Err(ConfigError::InvalidValue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_NAME_LEN;

    const TFT: &str = r#"
# ILI9341 with resistive touch
name = "ili9341-touch"

[panel]
kind = "raster"
width = 320
height = 240
buffer_divisor = 6     # 40-row bands
double_buffer = true
threshold = 200

[touch]
enabled = true
min_x = 200
max_x = 3_700
min_y = 240
max_y = 3800

[loop]
tick_ms = 3
"#;

    const EPAPER: &str = r#"
name = "epd-7in5-v2"

[panel]
kind = "mono"
width = 800
height = 480
buffer_divisor = 24

[refresh]
min_interval_ms = 3000
sleep_when_idle = true

[touch]
enabled = false

[loop]
tick_ms = 100
"#;

    #[test]
    fn test_parse_tft_config() {
        let config = parse_config(TFT).unwrap();
        assert_eq!(config.name.as_str(), "ili9341-touch");
        assert_eq!(config.panel.kind, PanelKind::Raster);
        assert_eq!(config.panel.width, 320);
        assert_eq!(config.panel.buffer_divisor, 6);
        assert!(config.panel.double_buffer);
        assert_eq!(config.touch.max_x, 3700);
        assert_eq!(config.loop_.tick_ms, 3);
        assert_eq!(config.refresh.min_interval_ms, 3000);
    }

    #[test]
    fn test_parse_epaper_config() {
        let config = parse_config(EPAPER).unwrap();
        assert_eq!(config.panel.kind, PanelKind::Mono);
        assert_eq!(config.panel.size().pixels(), 800 * 480);
        assert_eq!(config.panel.threshold, 200);
        assert!(config.refresh.sleep_when_idle);
        assert!(!config.touch.enabled);
        assert_eq!(config.loop_.tick_ms, 100);
    }

    #[test]
    fn test_shipped_configs_parse() {
        let tft = parse_config(include_str!("../../../tessera-firmware/display.toml")).unwrap();
        assert_eq!(tft.panel.kind, PanelKind::Raster);
        assert_eq!(tft.panel.buffer_divisor, 6);

        let epaper =
            parse_config(include_str!("../../../tessera-firmware/configs/epaper.toml")).unwrap();
        assert_eq!(epaper.panel.kind, PanelKind::Mono);
        assert!(epaper.refresh.sleep_when_idle);
    }

    #[test]
    fn test_empty_input_gives_defaults() {
        assert_eq!(parse_config(""), Ok(DisplayConfig::new()));
    }

    #[test]
    fn test_unknown_section() {
        assert_eq!(
            parse_config("[backlight]\nlevel = 3\n"),
            Err(ConfigError::InvalidSection)
        );
        assert_eq!(parse_config("[panel\n"), Err(ConfigError::InvalidSection));
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(parse_config("[loop]\ntick = 5\n"), Err(ConfigError::UnknownKey));
        assert_eq!(
            parse_config("[panel]\ndepth = 3\n"),
            Err(ConfigError::UnknownKey)
        );
        assert_eq!(
            parse_config("[loop]\nwidth = 3\n"),
            Err(ConfigError::UnknownKey)
        );
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            parse_config("[panel]\nwidth = wide\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[panel]\nthreshold = 256\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[panel]\nkind = \"oled\"\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[touch]\nenabled = yes\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(parse_config("name = unquoted\n"), Err(ConfigError::InvalidValue));
        assert_eq!(parse_config("[panel]\nwidth\n"), Err(ConfigError::InvalidValue));
    }

    #[test]
    fn test_parse_runs_validation() {
        assert_eq!(
            parse_config("[panel]\nbuffer_divisor = 0\n"),
            Err(ConfigError::ZeroDivisor)
        );
    }

    #[test]
    fn test_comment_inside_string_is_kept() {
        let config = parse_config("name = \"panel #2\" # trailing\n").unwrap();
        assert_eq!(config.name.as_str(), "panel #2");

        let config = parse_config("name = 'a # b' # 'quoted' comment\n").unwrap();
        assert_eq!(config.name.as_str(), "a # b");
    }

    #[test]
    fn test_section_header_with_comment() {
        let config = parse_config("[panel] # TFT\nwidth = 480 # wide\n").unwrap();
        assert_eq!(config.panel.width, 480);
        assert_eq!(
            parse_config("[panel] extra\n"),
            Err(ConfigError::InvalidSection)
        );
    }

    #[test]
    fn test_literal_strings() {
        let config = parse_config("name = 'tft'\n[panel]\nkind = 'mono'\n").unwrap();
        assert_eq!(config.name.as_str(), "tft");
        assert_eq!(config.panel.kind, PanelKind::Mono);
        assert_eq!(parse_config("name = 'tft\"\n"), Err(ConfigError::InvalidValue));
        assert_eq!(parse_config("name = \"a\"b\"\n"), Err(ConfigError::InvalidValue));
        assert_eq!(parse_config("name = \"a\\\\b\"\n"), Err(ConfigError::InvalidValue));

        let config = parse_config("name = 'say \"hi\"'\n").unwrap();
        assert_eq!(config.name.as_str(), "say \"hi\"");
    }

    #[test]
    fn test_name_length_limit() {
        let longest = "name = \"abcdefghijklmnopqrstuvwx\"\n";
        assert_eq!(parse_config(longest).unwrap().name.len(), MAX_NAME_LEN);
        assert_eq!(
            parse_config("name = \"abcdefghijklmnopqrstuvwxy\"\n"),
            Err(ConfigError::InvalidValue)
        );
    }
}
