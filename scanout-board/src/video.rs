//! Frame-buffer console entry point
//!
//! Carves the frame buffer off the top of DRAM, runs the bring-up
//! sequencer and hands back what a generic console needs to draw.

use scanout_core::config::DisplayConfig;
use scanout_core::framebuffer::FrameBufferInfo;
use scanout_core::state::{BringUpError, Stage};
use scanout_drivers::{DisplayContext, PipelineSequencer};
use scanout_hal::{ClockTree, DelayNs, RegisterBus};

/// A configured HDMI output
pub struct VideoOutput {
    config: DisplayConfig,
    sequencer: PipelineSequencer,
    info: Option<FrameBufferInfo>,
}

impl VideoOutput {
    pub fn new(config: DisplayConfig) -> Self {
        Self {
            config,
            sequencer: PipelineSequencer::new(config.chip_variant()),
            info: None,
        }
    }

    /// Configuration this output was built from
    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Current bring-up stage
    pub fn stage(&self) -> Stage {
        self.sequencer.stage()
    }

    /// Frame buffer of the running pipeline
    pub fn framebuffer(&self) -> Option<&FrameBufferInfo> {
        self.info.as_ref()
    }

    /// Bring the pipeline up with the configured mode
    ///
    /// `dram_end` is the CPU address one past the last byte of DRAM.
    pub fn init<B, C, D>(
        &mut self,
        ctx: &mut DisplayContext<B, C, D>,
        dram_end: u32,
    ) -> Result<FrameBufferInfo, BringUpError>
    where
        B: RegisterBus,
        C: ClockTree,
        D: DelayNs,
    {
        let Some(region) = self.config.framebuffer_region(dram_end) else {
            error!(
                "framebuffer: {} bytes do not fit below {:#x}",
                self.config.framebuffer_size,
                dram_end
            );
            return Err(BringUpError::InvalidMode);
        };
        debug!(
            "framebuffer: {:#x}, bus address {:#x}",
            region.base,
            region.bus_address()
        );

        let info = self.sequencer.bring_up(ctx, self.config.mode, &region)?;
        self.info = Some(info);
        Ok(info)
    }

    /// Stop scan-out and gate the pipeline off
    pub fn shutdown<B, C, D>(&mut self, ctx: &mut DisplayContext<B, C, D>)
    where
        B: RegisterBus,
        C: ClockTree,
        D: DelayNs,
    {
        self.sequencer.shutdown(ctx);
        self.info = None;
    }
}

/// Bring up the display for a frame-buffer console
///
/// Returns `None` on any failure after printing the diagnostic; the
/// console then carries on without video.
pub fn video_hw_init<B, C, D>(
    ctx: &mut DisplayContext<B, C, D>,
    config: &DisplayConfig,
    dram_end: u32,
) -> Option<FrameBufferInfo>
where
    B: RegisterBus,
    C: ClockTree,
    D: DelayNs,
{
    let mut output = VideoOutput::new(*config);
    match output.init(ctx, dram_end) {
        Ok(info) => {
            info!(
                "Setting up a {}x{} console at {:#x}",
                info.width,
                info.height,
                info.base
            );
            Some(info)
        }
        Err(e) => {
            error!("video init failed: {}", e.diagnostic());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use scanout_core::mode::ModeDescriptor;
    use scanout_core::variant::ChipKind;
    use scanout_drivers::blocks::hdmi;
    use scanout_drivers::sim::{SimBus, SimClocks, SimDelay, SimLog};

    const HDMI: u32 = 0x01C1_6000;
    const DRAM_END: u32 = 0x8000_0000;

    type SimContext<'a> = DisplayContext<SimBus<'a>, SimClocks<'a>, SimDelay<'a>>;

    fn context(log: &RefCell<SimLog>, sink: bool) -> SimContext<'_> {
        let mut bus = SimBus::new(log);
        bus.write_one_to_clear(HDMI + hdmi::reg::INT_CTRL);
        if sink {
            bus.preset(HDMI + hdmi::reg::HPD, hdmi::bits::HPD_DETECTED);
        }
        DisplayContext::new(bus, SimClocks::new(log), SimDelay::new(log))
    }

    #[test]
    fn test_video_hw_init_with_embedded_config() {
        let log = RefCell::new(SimLog::new());
        let mut ctx = context(&log, true);
        let config = crate::config::load_embedded().unwrap();

        let info = video_hw_init(&mut ctx, &config, DRAM_END).unwrap();

        assert_eq!(info.base, DRAM_END - (8 << 20));
        assert_eq!((info.width, info.height), (1280, 720));
        assert_eq!(info.stride(), 1280 * 4);
    }

    #[test]
    fn test_video_hw_init_without_sink() {
        let log = RefCell::new(SimLog::new());
        let mut ctx = context(&log, false);

        assert!(video_hw_init(&mut ctx, &DisplayConfig::default(), DRAM_END).is_none());
    }

    #[test]
    fn test_framebuffer_below_dram_base_is_refused() {
        let log = RefCell::new(SimLog::new());
        let mut ctx = context(&log, true);
        let mut output = VideoOutput::new(DisplayConfig::default());

        // 4 MiB of DRAM cannot hold an 8 MiB reservation
        assert_eq!(
            output.init(&mut ctx, 0x4040_0000),
            Err(BringUpError::InvalidMode)
        );
        assert!(log.borrow().ops().is_empty());
    }

    #[test]
    fn test_output_lifecycle_sun6i() {
        let log = RefCell::new(SimLog::new());
        let mut ctx = context(&log, true);
        let config = DisplayConfig {
            variant: ChipKind::Sun6i,
            mode: ModeDescriptor::CEA_1920X1080_60,
            ..DisplayConfig::default()
        };
        let mut output = VideoOutput::new(config);

        let info = output.init(&mut ctx, DRAM_END).unwrap();
        assert_eq!((info.width, info.height), (1920, 1080));
        assert_eq!(output.stage(), Stage::Running);
        assert_eq!(output.framebuffer(), Some(&info));

        output.shutdown(&mut ctx);
        assert_eq!(output.stage(), Stage::Idle);
        assert!(output.framebuffer().is_none());
    }
}
