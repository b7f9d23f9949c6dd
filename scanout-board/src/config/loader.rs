//! display.toml parsing
//!
//! Parses the embedded TOML into a `DisplayConfig` and rechecks what
//! `build.rs` checked, so configurations built some other way get the same
//! treatment.

use core::fmt;

use scanout_core::config::DisplayConfig;
use scanout_core::mode::ModeError;

/// Configuration embedded at build time
pub const DISPLAY_TOML: &str = include_str!("../../display.toml");

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// TOML syntax error or a key of the wrong type
    TomlParse,
    /// Mode descriptor breaks its invariants
    InvalidMode(ModeError),
    /// Reserved frame buffer cannot hold one frame
    FramebufferTooSmall {
        /// Bytes one frame needs
        needed: u32,
        /// Bytes reserved
        reserved: u32,
    },
}

impl From<ModeError> for ConfigError {
    fn from(e: ModeError) -> Self {
        ConfigError::InvalidMode(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TomlParse => f.write_str("display.toml: parse error"),
            ConfigError::InvalidMode(e) => write!(f, "display.toml: invalid mode ({:?})", e),
            ConfigError::FramebufferTooSmall { needed, reserved } => write!(
                f,
                "display.toml: framebuffer_size {} < {} bytes",
                reserved, needed
            ),
        }
    }
}

/// Parse and validate a display configuration
pub fn parse_config(text: &str) -> Result<DisplayConfig, ConfigError> {
    let config: DisplayConfig = toml::from_str(text).map_err(|_| ConfigError::TomlParse)?;

    config.mode.validate()?;

    let needed = config.mode.framebuffer_bytes();
    if needed > config.framebuffer_size {
        return Err(ConfigError::FramebufferTooSmall {
            needed,
            reserved: config.framebuffer_size,
        });
    }

    Ok(config)
}

/// Load the configuration embedded at build time
pub fn load_embedded() -> Result<DisplayConfig, ConfigError> {
    info!("Loading display configuration");
    let config = parse_config(DISPLAY_TOML)?;
    info!(
        "display.toml: {}x{}@{}",
        config.mode.xres,
        config.mode.yres,
        config.mode.refresh_hz
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanout_core::mode::ModeDescriptor;
    use scanout_core::variant::ChipKind;

    #[test]
    fn test_embedded_config_parses() {
        let config = load_embedded().unwrap();
        assert_eq!(config.variant, ChipKind::Sun7i);
        assert_eq!(config.mode, ModeDescriptor::CEA_1280X720_50);
        assert_eq!(config.framebuffer_size, 8 << 20);
        assert_eq!(config.sdram_base, 0x4000_0000);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(parse_config("").unwrap(), DisplayConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = parse_config(
            r#"
            variant = "sun6i"

            [mode]
            xres = 1024
            yres = 768
            pixclock_khz = 65000
            left_margin = 160
            right_margin = 24
            upper_margin = 29
            lower_margin = 3
            hsync_len = 136
            vsync_len = 6
            refresh_hz = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.variant, ChipKind::Sun6i);
        assert_eq!(config.mode, ModeDescriptor::VESA_1024X768_60);
        assert!(!config.mode.hsync_active_high);
    }

    #[test]
    fn test_bad_syntax() {
        assert_eq!(parse_config("variant = "), Err(ConfigError::TomlParse));
        assert_eq!(
            parse_config(r#"variant = "sun9i""#),
            Err(ConfigError::TomlParse)
        );
    }

    #[test]
    fn test_zero_refresh_rejected() {
        let text = DISPLAY_TOML.replace("refresh_hz = 50", "refresh_hz = 0");
        assert_eq!(
            parse_config(&text),
            Err(ConfigError::InvalidMode(ModeError::ZeroRefresh))
        );
    }

    #[test]
    fn test_zero_porches_accepted() {
        let text = DISPLAY_TOML
            .replace("right_margin = 220", "right_margin = 0")
            .replace("lower_margin = 5", "lower_margin = 0");
        let config = parse_config(&text).unwrap();
        assert_eq!(config.mode.right_margin, 0);
        assert_eq!(config.mode.lower_margin, 0);
    }

    #[test]
    fn test_oversized_mode_rejected() {
        let text = DISPLAY_TOML
            .replace("xres = 1280", "xres = 32768")
            .replace("yres = 720", "yres = 32768");
        assert_eq!(
            parse_config(&text),
            Err(ConfigError::InvalidMode(ModeError::TimingOutOfRange))
        );
    }

    #[test]
    fn test_framebuffer_too_small() {
        let text = DISPLAY_TOML.replace("framebuffer_size = 0x800000", "framebuffer_size = 0x100000");
        assert_eq!(
            parse_config(&text),
            Err(ConfigError::FramebufferTooSmall {
                needed: 1280 * 720 * 4,
                reserved: 0x10_0000,
            })
        );
    }
}
