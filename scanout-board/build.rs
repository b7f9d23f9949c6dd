//! Build script for scanout-board
//!
//! Validates display.toml at compile time so a bad mode fails the build
//! instead of leaving the board with a dark screen.

use std::fs;
use std::path::Path;

/// Keys every `[mode]` table must carry as positive integers
const MODE_KEYS: [&str; 4] = ["xres", "yres", "pixclock_khz", "refresh_hz"];

/// Porch and sync widths, which may be zero
const TIMING_KEYS: [&str; 6] = [
    "left_margin",
    "right_margin",
    "upper_margin",
    "lower_margin",
    "hsync_len",
    "vsync_len",
];

/// Line and frame totals the timing registers can hold
const MAX_HTOTAL: i64 = 0x1_0000;
const MAX_VTOTAL: i64 = 0x7FFF;

const VARIANTS: [&str; 4] = ["sun4i", "sun5i", "sun6i", "sun7i"];

/// Pixel clock range the video PLL can reach (kHz)
const PIXCLOCK_MIN_KHZ: i64 = 3000 * 9 / 15;
const PIXCLOCK_MAX_KHZ: i64 = 3000 * 127 * 2;

const DEFAULT_FRAMEBUFFER_SIZE: i64 = 8 << 20;

fn main() {
    validate_config();
}

/// Validate display.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=display.toml");
    println!("cargo:rerun-if-changed=build.rs");

    let config_path = Path::new("display.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: display.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The board crate embeds a display.toml configuration file.       ║\n\
            ║  Please create one in the scanout-board directory.               ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read display.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in display.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_variant(&config, &mut errors);
    validate_mode(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid display configuration                            ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=display.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn validate_variant(config: &toml::Value, errors: &mut Vec<String>) {
    match config.get("variant") {
        None => {}
        Some(toml::Value::String(v)) if VARIANTS.contains(&v.as_str()) => {}
        Some(_) => errors.push("variant must be 'sun4i', 'sun5i', 'sun6i' or 'sun7i'".into()),
    }

    for key in ["framebuffer_size", "sdram_base"] {
        match config.get(key) {
            None => {}
            Some(toml::Value::Integer(n)) if (0..=i64::from(u32::MAX)).contains(n) => {}
            Some(_) => errors.push(format!("{} must be a 32-bit unsigned integer", key)),
        }
    }
}

/// Validate the `[mode]` table
fn validate_mode(config: &toml::Value, errors: &mut Vec<String>) {
    let mode = match config.get("mode") {
        // Missing table means the built-in default mode
        None => return,
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[mode] must be a table".into());
            return;
        }
    };

    let mut value = |key: &str, min: i64| -> Option<i64> {
        match mode.get(key) {
            Some(toml::Value::Integer(n)) if *n >= min && *n <= i64::from(u32::MAX) => Some(*n),
            Some(toml::Value::Integer(_)) if min > 0 => {
                errors.push(format!("[mode] '{}' must be positive", key));
                None
            }
            Some(toml::Value::Integer(_)) => {
                errors.push(format!("[mode] '{}' must not be negative", key));
                None
            }
            Some(_) => {
                errors.push(format!("[mode] '{}' must be an integer", key));
                None
            }
            None => {
                errors.push(format!("[mode] missing '{}'", key));
                None
            }
        }
    };

    let values: Vec<Option<i64>> = MODE_KEYS.iter().map(|key| value(key, 1)).collect();
    let timing: Vec<Option<i64>> = TIMING_KEYS.iter().map(|key| value(key, 0)).collect();

    for key in ["hsync_active_high", "vsync_active_high"] {
        if let Some(v) = mode.get(key) {
            if !v.is_bool() {
                errors.push(format!("[mode] '{}' must be true or false", key));
            }
        }
    }

    // Totals are back porch + active + front porch + sync
    if let (Some(xres), Some(left), Some(right), Some(hsync)) =
        (values[0], timing[0], timing[1], timing[4])
    {
        if left + xres + right + hsync > MAX_HTOTAL {
            errors.push(format!("[mode] horizontal total must be at most {}", MAX_HTOTAL));
        }
    }
    if let (Some(yres), Some(upper), Some(lower), Some(vsync)) =
        (values[1], timing[2], timing[3], timing[5])
    {
        if upper + yres + lower + vsync > MAX_VTOTAL {
            errors.push(format!("[mode] vertical total must be at most {}", MAX_VTOTAL));
        }
    }

    if let Some(pixclock) = values[2] {
        if !(PIXCLOCK_MIN_KHZ..=PIXCLOCK_MAX_KHZ).contains(&pixclock) {
            errors.push(format!(
                "[mode] pixclock_khz must be {}-{}",
                PIXCLOCK_MIN_KHZ, PIXCLOCK_MAX_KHZ
            ));
        }
    }

    if let (Some(xres), Some(yres)) = (values[0], values[1]) {
        let needed = xres * yres * 4;
        let reserved = config
            .get("framebuffer_size")
            .and_then(|v| v.as_integer())
            .unwrap_or(DEFAULT_FRAMEBUFFER_SIZE);
        if needed > reserved {
            errors.push(format!(
                "framebuffer_size {} < {} bytes for {}x{}",
                reserved, needed, xres, yres
            ));
        }
    }
}
