//! Pipeline bring-up sequencer
//!
//! Drives the [`Stage`] machine from `scanout-core` against real (or
//! simulated) hardware. Each call to [`PipelineSequencer::step`] performs
//! the work of the current stage and feeds the resulting [`Event`] back
//! into the transition table; [`PipelineSequencer::bring_up`] loops until
//! a terminal stage.
//!
//! All hardware access goes through one [`DisplayContext`], passed in by
//! the caller. The sequencer owns only software state.

use scanout_core::clock::ClockSolution;
use scanout_core::framebuffer::{FrameBufferInfo, FramebufferRegion};
use scanout_core::mode::ModeDescriptor;
use scanout_core::state::{BringUpError, Event, Stage};
use scanout_core::variant::ChipVariant;
use scanout_hal::{ClockTree, DelayNs, RegisterBus};

use crate::blocks::{CompositorBlock, DrcBlock, TimingControllerBlock, TransmitterBlock};

/// Total configure passes before a sync fault is reported
pub const RETRY_BUDGET: u8 = 3;

/// Hardware services the sequencer drives
pub struct DisplayContext<B, C, D> {
    /// Register access
    pub bus: B,
    /// Clock controller
    pub clocks: C,
    /// Busy-wait source
    pub delay: D,
}

impl<B, C, D> DisplayContext<B, C, D>
where
    B: RegisterBus,
    C: ClockTree,
    D: DelayNs,
{
    pub fn new(bus: B, clocks: C, delay: D) -> Self {
        Self { bus, clocks, delay }
    }
}

/// Software view of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineState {
    /// Hot-plug detect saw a sink on the last probe
    pub link_detected: bool,
    /// Transmitter is powered for use
    pub enabled: bool,
    /// Pixel clock programmed by the last configure pass
    pub last_clock: Option<ClockSolution>,
}

/// Accepted bring-up request
#[derive(Debug, Clone, Copy)]
struct Request {
    mode: ModeDescriptor,
    /// DRAM-relative address handed to the compositor
    bus_address: u32,
}

/// Bring-up state machine driver
pub struct PipelineSequencer {
    stage: Stage,
    state: PipelineState,
    request: Option<Request>,
    retries_left: u8,
    passes: u8,

    composer: CompositorBlock,
    tcon: TimingControllerBlock,
    hdmi: TransmitterBlock,
    drc: Option<DrcBlock>,
}

impl PipelineSequencer {
    /// Create an idle sequencer for a chip generation
    pub fn new(variant: ChipVariant) -> Self {
        Self {
            stage: Stage::Idle,
            state: PipelineState::default(),
            request: None,
            retries_left: RETRY_BUDGET,
            passes: 0,
            composer: CompositorBlock::new(&variant),
            tcon: TimingControllerBlock::new(&variant),
            hdmi: TransmitterBlock::new(&variant),
            drc: variant.needs_drc.then(DrcBlock::new),
        }
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Current software state
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Configure passes run for the current request
    pub fn passes(&self) -> u8 {
        self.passes
    }

    /// Sync-fault retries still available
    pub fn retries_left(&self) -> u8 {
        self.retries_left
    }

    fn handle_event(&mut self, event: Event) {
        let next = self.stage.transition(event);
        if next != self.stage {
            debug!("stage {:?} -> {:?}", self.stage, next);
        }
        if event.is_failure() {
            if let Some(e) = next.error() {
                error!("display: bring-up failed: {}", e.diagnostic());
            }
        }
        self.stage = next;
    }

    /// Accept a bring-up request
    ///
    /// Everything that can be checked without hardware is checked here: the
    /// mode's invariants, that the frame buffer holds one frame, and that the
    /// pixel clock is reachable. A rejected request moves straight to
    /// [`Stage::Failed`]. Outside [`Stage::Idle`] the request is refused
    /// with the standing failure, if any; call
    /// [`shutdown`](Self::shutdown) first.
    pub fn request(
        &mut self,
        mode: ModeDescriptor,
        region: &FramebufferRegion,
    ) -> Result<(), BringUpError> {
        if self.stage != Stage::Idle {
            warn!("bring-up requested in stage {:?}, ignored", self.stage);
            return Err(self.stage.error().unwrap_or(BringUpError::InvalidMode));
        }

        if let Err(e) = self.check_request(&mode, region) {
            error!("rejected {}x{}: {}", mode.xres, mode.yres, e.diagnostic());
            self.handle_event(Event::Rejected(e));
            return Err(e);
        }

        self.request = Some(Request {
            mode,
            bus_address: region.bus_address(),
        });
        self.retries_left = RETRY_BUDGET;
        self.passes = 0;
        self.handle_event(Event::BringUpRequested);
        Ok(())
    }

    fn check_request(
        &self,
        mode: &ModeDescriptor,
        region: &FramebufferRegion,
    ) -> Result<(), BringUpError> {
        mode.validate()?;
        if !region.holds(mode) {
            return Err(BringUpError::InvalidMode);
        }
        self.tcon.solver().solve(mode.pixclock_khz)?;
        Ok(())
    }

    /// Run the current stage once and return the stage reached
    pub fn step<B, C, D>(&mut self, ctx: &mut DisplayContext<B, C, D>) -> Stage
    where
        B: RegisterBus,
        C: ClockTree,
        D: DelayNs,
    {
        let Some(request) = self.request else {
            return self.stage;
        };

        let event = match self.stage {
            Stage::Detecting => self.detect(ctx),
            Stage::Configuring => self.configure(ctx, &request),
            Stage::Enabling => self.enable(ctx, &request.mode),
            Stage::Verifying => self.verify(ctx),
            _ => return self.stage,
        };
        self.handle_event(event);
        self.stage
    }

    fn detect<B, C, D>(&mut self, ctx: &mut DisplayContext<B, C, D>) -> Event
    where
        B: RegisterBus,
        C: ClockTree,
        D: DelayNs,
    {
        let linked = self
            .hdmi
            .detect_link(&mut ctx.bus, &mut ctx.clocks, &mut ctx.delay);
        self.state.link_detected = linked;
        if linked {
            self.state.enabled = true;
            info!("HDMI connected");
            Event::SinkDetected
        } else {
            info!("HDMI not connected");
            Event::SinkAbsent
        }
    }

    fn configure<B, C, D>(&mut self, ctx: &mut DisplayContext<B, C, D>, request: &Request) -> Event
    where
        B: RegisterBus,
        C: ClockTree,
        D: DelayNs,
    {
        self.passes = self.passes.saturating_add(1);
        debug!("configure pass {}", self.passes);

        match self.configure_blocks(ctx, request) {
            Ok(clock) => {
                self.state.last_clock = Some(clock);
                Event::Configured
            }
            Err(e) => {
                error!("configure failed: {}", e.diagnostic());
                Event::ConfigureFailed(e)
            }
        }
    }

    fn configure_blocks<B, C, D>(
        &mut self,
        ctx: &mut DisplayContext<B, C, D>,
        request: &Request,
    ) -> Result<ClockSolution, BringUpError>
    where
        B: RegisterBus,
        C: ClockTree,
        D: DelayNs,
    {
        let mode = &request.mode;

        self.composer.init(&mut ctx.bus, &mut ctx.clocks)?;
        self.composer
            .configure(&mut ctx.bus, mode, request.bus_address);

        self.tcon.init(&mut ctx.bus, &mut ctx.clocks);
        let clock = self.tcon.configure(&mut ctx.bus, &mut ctx.clocks, mode)?;

        if let Some(drc) = &self.drc {
            drc.init(&mut ctx.clocks);
        }

        self.hdmi.init(&mut ctx.bus);
        self.hdmi.configure(&mut ctx.bus, mode, &clock);
        Ok(clock)
    }

    fn enable<B, C, D>(&mut self, ctx: &mut DisplayContext<B, C, D>, mode: &ModeDescriptor) -> Event
    where
        B: RegisterBus,
        C: ClockTree,
        D: DelayNs,
    {
        let settle_us = mode.settle_delay_us();

        self.hdmi.disable_output(&mut ctx.bus);
        self.tcon.disable_output(&mut ctx.bus);
        self.composer.clear_start(&mut ctx.bus);

        self.composer.load_registers(&mut ctx.bus);
        self.composer.set_start(&mut ctx.bus);
        ctx.delay.delay_us(settle_us);

        self.tcon.enable_output(&mut ctx.bus);
        ctx.delay.delay_us(settle_us);

        self.hdmi.enable_output(&mut ctx.bus);
        ctx.delay.delay_us(settle_us);

        Event::Enabled
    }

    fn verify<B, C, D>(&mut self, ctx: &mut DisplayContext<B, C, D>) -> Event
    where
        B: RegisterBus,
        C: ClockTree,
        D: DelayNs,
    {
        let status = self.hdmi.read_fault_status(&mut ctx.bus);
        if !status.is_faulted() {
            return Event::SyncStable;
        }

        self.retries_left = self.retries_left.saturating_sub(1);
        if self.retries_left > 0 {
            warn!(
                "HDMI fifo fault {:#x}, retrying ({} left)",
                status.0,
                self.retries_left
            );
            Event::SyncFaultRetry
        } else {
            // Hardware stays enabled; nothing is rolled back
            Event::SyncFaultExhausted
        }
    }

    /// Run a complete bring-up for `mode` into `region`
    ///
    /// Returns the descriptor a frame-buffer console needs, or the reason
    /// the pipeline could not be brought up.
    pub fn bring_up<B, C, D>(
        &mut self,
        ctx: &mut DisplayContext<B, C, D>,
        mode: ModeDescriptor,
        region: &FramebufferRegion,
    ) -> Result<FrameBufferInfo, BringUpError>
    where
        B: RegisterBus,
        C: ClockTree,
        D: DelayNs,
    {
        self.request(mode, region)?;

        while !self.step(ctx).is_terminal() {}

        match self.stage {
            Stage::Running => {
                info!("display: {}x{} ready", mode.xres, mode.yres);
                Ok(FrameBufferInfo::new(region.base, &mode))
            }
            Stage::Failed(e) => Err(e),
            _ => Err(BringUpError::InvalidMode),
        }
    }

    /// Stop scan-out, gate every block off and return to idle
    ///
    /// Safe to call from any settled stage, including after a failed
    /// bring-up that left hardware partially enabled.
    pub fn shutdown<B, C, D>(&mut self, ctx: &mut DisplayContext<B, C, D>)
    where
        B: RegisterBus,
        C: ClockTree,
        D: DelayNs,
    {
        if !self.stage.is_terminal() {
            warn!("shutdown in stage {:?}, ignored", self.stage);
            return;
        }

        self.hdmi.shutdown(&mut ctx.bus, &mut ctx.clocks);
        self.tcon.shutdown(&mut ctx.bus, &mut ctx.clocks);
        self.composer.shutdown(&mut ctx.bus, &mut ctx.clocks);
        if let Some(drc) = &self.drc {
            drc.shutdown(&mut ctx.clocks);
        }
        ctx.clocks.set_reference_clock(0);

        self.state = PipelineState::default();
        self.request = None;
        self.handle_event(Event::Shutdown);
        info!("display: shut down");
    }
}
