//! Build script for tessera-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates the display configuration and copies it to OUT_DIR
//! - Sizes the band buffers for the selected board
//!
//! The configuration file defaults to `display.toml`; set `TESSERA_CONFIG`
//! to build with another one (paths are relative to this crate).

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tessera_core::buffer::BufferPool;
use tessera_core::config::{parse_config, DisplayConfig, MAX_NAME_LEN};

/// Keys accepted in each section; `""` is the top level
const KNOWN_KEYS: &[(&str, &[&str])] = &[
    ("", &["name"]),
    (
        "panel",
        &["kind", "width", "height", "buffer_divisor", "double_buffer", "threshold"],
    ),
    ("refresh", &["min_interval_ms", "sleep_when_idle"]),
    ("touch", &["enabled", "min_x", "max_x", "min_y", "max_y"]),
    ("loop", &["tick_ms"]),
];

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    setup_linker(&out_dir);
    validate_config(&out_dir);
}

/// Set up linker search paths for memory.x
fn setup_linker(out_dir: &Path) {
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate the display configuration at compile time
fn validate_config(out_dir: &Path) {
    println!("cargo:rerun-if-env-changed=TESSERA_CONFIG");
    let config_name = env::var("TESSERA_CONFIG").unwrap_or_else(|_| "display.toml".into());
    println!("cargo:rerun-if-changed={}", config_name);

    let config_path = Path::new(&config_name);

    if !config_path.exists() {
        fail(
            &format!("{} not found", config_name),
            &["The firmware requires a display configuration file.".into()],
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail(
            &format!("Failed to read {}", config_name),
            &[e.to_string()],
        ),
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => fail(
            &format!("Invalid TOML syntax in {}", config_name),
            &e.to_string().lines().map(String::from).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_keys(&config, &mut errors);
    validate_name(&config, &mut errors);
    validate_panel(&config, &mut errors);
    validate_refresh(&config, &mut errors);
    validate_touch(&config, &mut errors);
    validate_loop(&config, &mut errors);

    if !errors.is_empty() {
        fail(&format!("Invalid configuration in {}", config_name), &errors);
    }

    // The firmware parses a TOML subset; it must accept the file too
    let parsed = match parse_config(&config_content) {
        Ok(parsed) => parsed,
        Err(e) => fail(
            &format!("{} rejected by the firmware parser", config_name),
            &[
                format!("{:?}", e),
                "Use [section] headers and key = value lines only.".into(),
                "Strings may not contain escapes.".into(),
            ],
        ),
    };

    let band_bytes = band_budget();
    if let Err(message) = check_band(&parsed, band_bytes) {
        fail(&format!("Invalid configuration in {}", config_name), &[message]);
    }
    fs::write(
        out_dir.join("band.rs"),
        format!("pub const BAND_BYTES: usize = {};\n", band_bytes),
    )
    .unwrap();

    fs::write(out_dir.join("display.toml"), config_content).unwrap();
    println!("cargo:warning={} validated successfully", config_name);
}

/// Abort the build with a boxed message
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<57}║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        lines
            .iter()
            .map(|line| {
                let truncated = if line.len() > 62 {
                    format!("{}...", &line[..59])
                } else {
                    line.to_string()
                };
                format!("║  • {:<62} ║", truncated)
            })
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Bytes per band buffer on the selected board
fn band_budget() -> usize {
    if env::var_os("CARGO_FEATURE_BOARD_EPAPER").is_some() {
        // 20 luminance rows of the 800 px panel
        800 * 20
    } else {
        // 40 RGB565 rows of the 320 px panel
        320 * 40 * 2
    }
}

/// Check that one band at the configured divisor fits the board's buffers
fn check_band(config: &DisplayConfig, band_bytes: usize) -> Result<(), String> {
    let panel = &config.panel;
    let mut band = vec![0u8; band_bytes];
    match BufferPool::new(
        [band.as_mut_slice()],
        panel.size(),
        panel.format(),
        panel.buffer_divisor,
    ) {
        Ok(_) => Ok(()),
        Err(_) => {
            let rows = (panel.height / panel.buffer_divisor.max(1)).max(1);
            let needed = usize::from(panel.width)
                * usize::from(rows)
                * panel.format().bytes_per_pixel();
            Err(format!(
                "[panel] buffer_divisor {} needs {} B per band, board has {} B",
                panel.buffer_divisor, needed, band_bytes
            ))
        }
    }
}

fn table<'a>(config: &'a toml::Value, name: &str) -> Option<&'a toml::value::Table> {
    config.get(name).and_then(|v| v.as_table())
}

fn check_range(
    section: &toml::value::Table,
    prefix: &str,
    key: &str,
    min: i64,
    max: i64,
    errors: &mut Vec<String>,
) {
    match section.get(key) {
        None => {}
        Some(toml::Value::Integer(v)) if (min..=max).contains(v) => {}
        Some(toml::Value::Integer(_)) => {
            errors.push(format!("[{}] {} must be {}-{}", prefix, key, min, max))
        }
        Some(_) => errors.push(format!("[{}] {} must be an integer", prefix, key)),
    }
}

fn check_bool(section: &toml::value::Table, prefix: &str, key: &str, errors: &mut Vec<String>) {
    if let Some(value) = section.get(key) {
        if !value.is_bool() {
            errors.push(format!("[{}] {} must be true or false", prefix, key));
        }
    }
}

fn validate_keys(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };
    for (key, value) in root {
        if value.is_table() {
            match KNOWN_KEYS.iter().find(|(section, _)| *section == key.as_str()) {
                Some((_, keys)) if !key.is_empty() => {
                    for inner in value.as_table().into_iter().flat_map(|t| t.keys()) {
                        if !keys.contains(&inner.as_str()) {
                            errors.push(format!("[{}] unknown key '{}'", key, inner));
                        }
                    }
                }
                _ => errors.push(format!("Unknown section [{}]", key)),
            }
        } else if !KNOWN_KEYS[0].1.contains(&key.as_str()) {
            errors.push(format!("Unknown top-level key '{}'", key));
        }
    }
}

fn validate_name(config: &toml::Value, errors: &mut Vec<String>) {
    match config.get("name") {
        None => {}
        Some(toml::Value::String(name)) if name.len() <= MAX_NAME_LEN => {}
        Some(toml::Value::String(_)) => {
            errors.push(format!("name must be at most {} bytes", MAX_NAME_LEN))
        }
        Some(_) => errors.push("name must be a string".into()),
    }
}

fn validate_panel(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(panel) = table(config, "panel") else {
        errors.push("Missing [panel] section".into());
        return;
    };

    let kind = match panel.get("kind") {
        Some(toml::Value::String(kind)) if kind == "raster" || kind == "mono" => kind.as_str(),
        Some(_) => {
            errors.push("[panel] kind must be 'raster' or 'mono'".into());
            return;
        }
        None => "raster",
    };

    // The board feature decides which driver gets wired up
    let tft = env::var_os("CARGO_FEATURE_BOARD_TFT").is_some();
    let epaper = env::var_os("CARGO_FEATURE_BOARD_EPAPER").is_some();
    if tft && kind != "raster" {
        errors.push("board-tft needs [panel] kind = \"raster\"".into());
    }
    if epaper && kind != "mono" {
        errors.push("board-epaper needs [panel] kind = \"mono\"".into());
    }

    check_range(panel, "panel", "width", 1, i64::from(u16::MAX), errors);
    check_range(panel, "panel", "height", 1, i64::from(u16::MAX), errors);
    check_range(panel, "panel", "buffer_divisor", 1, i64::from(u16::MAX), errors);
    check_range(panel, "panel", "threshold", 0, 255, errors);
    check_bool(panel, "panel", "double_buffer", errors);
}

fn validate_refresh(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(refresh) = table(config, "refresh") else {
        return;
    };
    check_range(refresh, "refresh", "min_interval_ms", 0, i64::from(u32::MAX), errors);
    check_bool(refresh, "refresh", "sleep_when_idle", errors);
}

fn validate_touch(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(touch) = table(config, "touch") else {
        return;
    };
    check_bool(touch, "touch", "enabled", errors);
    for key in ["min_x", "max_x", "min_y", "max_y"] {
        check_range(touch, "touch", key, 0, 4095, errors);
    }

    let axis = |lo: &str, hi: &str| match (touch.get(lo), touch.get(hi)) {
        (Some(toml::Value::Integer(a)), Some(toml::Value::Integer(b))) => a < b,
        _ => true,
    };
    if !axis("min_x", "max_x") || !axis("min_y", "max_y") {
        errors.push("[touch] each min must be below its max".into());
    }
}

fn validate_loop(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(tick) = table(config, "loop") else {
        return;
    };
    check_range(tick, "loop", "tick_ms", 1, 10_000, errors);
}
