//! The scanline raster engine.
//!
//! Produces one pixel-complete frame per loop iteration, forever, until
//! stopped. Per scanline the engine publishes the line number, applies any
//! pending address change, and evaluates the bad-line predicate. The
//! predicate gates the CPU cycle penalty, the staged mode commit and the
//! active mode's bad-line hook, always together. It then composes the line
//! and spends the fixed per-line cycle count on the shared clock. The clock
//! is the only pacing.
//!
//! # Line composition
//!
//! Content lines are built in five passes: backfill, background-priority
//! sprites, mode foreground, remaining sprites, border strips. Border lines
//! are a single fill. The raster interrupt fires before any pixel work for
//! its line, so interrupt handlers polling the raster register already see
//! the interrupt line.

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use emu_clock::{Clock, ClockHandle};
use log::{debug, error, info, trace};

use crate::RasterError;
use crate::frame::{FrameBuffer, FrameSink};
use crate::geometry::{
    BAD_LINE_PENALTY, BORDER_WIDTH, CONTENT_WIDTH, CYCLES_PER_LINE, DISPLAY_WIDTH,
    LAST_VISIBLE_LINE, OVERSCAN_LINES, SPRITE_Y_OFFSET, TOTAL_LINES, WIDE_BORDER_LEFT,
    WIDE_BORDER_RIGHT, WIDE_BORDER_ROWS, WINDOW_END_LINE, WINDOW_FIRST_LINE,
};
use crate::memory::VideoMemory;
use crate::modes::{ModeRasterer, ModeVariant, ScanlineRasterer};
use crate::palette::{BLACK, PALETTE, WHITE, argb};
use crate::registers::RegisterFile;
use crate::sprites::SpriteCompositor;
use crate::state::RasterState;

/// Receiver of the raster interrupt.
///
/// Raised from the rendering thread, before any pixel work for the matching
/// line.
pub trait InterruptLine: Send {
    fn raise(&mut self, line: u16);
}

/// Interrupt line wired to nothing.
pub struct NoInterrupt;

impl InterruptLine for NoInterrupt {
    fn raise(&mut self, _line: u16) {}
}

/// Everything the engine needs wired up at construction.
pub struct EngineConfig {
    /// System memory as the video chip sees it.
    pub memory: Arc<dyn VideoMemory>,
    /// Register file shared with the external register-write path.
    pub registers: Arc<Mutex<RegisterFile>>,
    /// Sprite layer renderer.
    pub sprites: Box<dyn SpriteCompositor>,
    /// Consumer of completed frames.
    pub sink: Box<dyn FrameSink>,
    /// Raster interrupt receiver.
    pub interrupt: Box<dyn InterruptLine>,
    /// Paint the per-line diagnostic marker pixels.
    pub diagnostic_overlay: bool,
}

/// State shared between the engine and its handles.
struct Shared {
    state: Mutex<RasterState>,
    stop: AtomicBool,
    present_ready: AtomicBool,
}

/// The raster engine. Owns the frame buffer and the rendering loop; all
/// cross-thread operations go through a [`RasterHandle`].
pub struct RasterEngine {
    memory: Arc<dyn VideoMemory>,
    registers: Arc<Mutex<RegisterFile>>,
    sprites: Box<dyn SpriteCompositor>,
    sink: Box<dyn FrameSink>,
    interrupt: Box<dyn InterruptLine>,
    diagnostic_overlay: bool,
    clock: ClockHandle,
    shared: Arc<Shared>,
    fb: FrameBuffer,
    mode: ModeRasterer,
    /// Engine-side copy of the address registers, refreshed from the shared
    /// state at frame start and on address changes.
    addresses: (u16, u16, u16),
    clock_resumed: bool,
}

impl RasterEngine {
    /// Create an engine and register it as a participant of `clock`.
    ///
    /// The clock handle is held for the engine's entire lifetime and
    /// released when the engine is dropped.
    #[must_use]
    pub fn new(config: EngineConfig, clock: &Clock) -> Self {
        Self {
            memory: config.memory,
            registers: config.registers,
            sprites: config.sprites,
            sink: config.sink,
            interrupt: config.interrupt,
            diagnostic_overlay: config.diagnostic_overlay,
            clock: clock.register(),
            shared: Arc::new(Shared {
                state: Mutex::new(RasterState::new()),
                stop: AtomicBool::new(false),
                present_ready: AtomicBool::new(false),
            }),
            fb: FrameBuffer::new(),
            mode: ModeRasterer::new(ModeVariant::default()),
            addresses: (0, 0, 0),
            clock_resumed: false,
        }
    }

    /// A handle for the external register-write path.
    #[must_use]
    pub fn handle(&self) -> RasterHandle {
        RasterHandle {
            shared: Arc::clone(&self.shared),
            registers: Arc::clone(&self.registers),
        }
    }

    /// Run the scanline loop until terminated.
    ///
    /// Clock participation stays suspended until the one-shot presentation
    /// readiness signal arrives; until then frames free-run without pacing
    /// so the engine cannot hold the CPU back behind a sink that is not
    /// ready to consume anything.
    pub fn run(&mut self) -> Result<(), RasterError> {
        self.clock.prepare();
        self.clock.suspend_participation();
        info!("raster engine running");
        while !self.shared.stop.load(Ordering::Relaxed) {
            self.render_frame()?;
        }
        info!("raster engine terminated");
        Ok(())
    }

    /// Move the engine onto its own rendering thread.
    ///
    /// A [`RasterError`] escaping the loop is fatal to the host process:
    /// continuing would desynchronise the shared clock and corrupt every
    /// subsequent frame.
    #[must_use]
    pub fn spawn(mut self) -> JoinHandle<()> {
        let builder = thread::Builder::new().name("raster-engine".into());
        let spawned = builder.spawn(move || {
            if let Err(e) = self.run() {
                error!("raster engine failed: {e}");
                process::exit(1);
            }
        });
        match spawned {
            Ok(join) => join,
            Err(e) => {
                error!("cannot spawn raster engine thread: {e}");
                process::exit(1);
            }
        }
    }

    /// Render one frame; publish it unless terminated mid-way.
    ///
    /// Public for single-threaded (headless, test) use; the threaded path
    /// goes through [`spawn`](Self::spawn).
    pub fn render_frame(&mut self) -> Result<(), RasterError> {
        if !self.clock_resumed && self.shared.present_ready.load(Ordering::Acquire) {
            debug!("presentation ready, resuming clock participation");
            self.clock.resume_participation();
            self.clock_resumed = true;
        }

        // Re-prime the active mode with the current addresses, like every
        // frame start.
        let (charset, matrix, bitmap) = {
            let mut state = self.lock_state();
            let _ = state.take_address_change();
            state.addresses()
        };
        self.addresses = (charset, matrix, bitmap);
        self.mode.start_frame(charset, matrix, bitmap);

        for line in 0..TOTAL_LINES {
            if self.shared.stop.load(Ordering::Relaxed) {
                debug!("terminate honoured at line {line}, frame discarded");
                return Ok(());
            }
            self.render_line(line)?;
            self.clock.advance(CYCLES_PER_LINE);
        }

        trace!("frame complete, publishing");
        self.sink.frame_ready(&self.fb);
        Ok(())
    }

    /// One scanline: state upkeep, bad-line effects, composition.
    fn render_line(&mut self, line: usize) -> Result<(), RasterError> {
        let regs = *self
            .registers
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let bad_line = (line & 7) as u8 == regs.vertical_scroll();

        let (address_change, committed) = {
            let mut state = self.lock_state();
            state.set_current_line(line as u16);
            let change = state.take_address_change();
            let committed = if bad_line {
                state.commit_scheduled_mode()
            } else {
                None
            };
            (change, committed)
        };

        if let Some((charset, matrix, bitmap)) = address_change {
            self.addresses = (charset, matrix, bitmap);
            self.mode.start_frame(charset, matrix, bitmap);
        }

        if bad_line {
            // All three bad-line effects fire together, or not at all.
            self.clock.steal(BAD_LINE_PENALTY);
            if let Some(variant) = committed {
                debug!("mode commit at bad line {line}: {variant:?}");
                let (charset, matrix, bitmap) = self.addresses;
                self.mode = ModeRasterer::new(variant);
                self.mode.start_frame(charset, matrix, bitmap);
            }
            self.mode.on_bad_line(line, &*self.memory)?;
        }

        self.draw_line(line, &regs, bad_line)
    }

    /// Compose one scanline into the frame buffer.
    fn draw_line(
        &mut self,
        line: usize,
        regs: &RegisterFile,
        bad_line: bool,
    ) -> Result<(), RasterError> {
        // The interrupt fires before any pixel work, visible lines or not.
        let interrupt_line = line as u16 == regs.interrupt_target_line();
        if interrupt_line {
            trace!("raster interrupt at line {line}");
            self.interrupt.raise(line as u16);
        }

        if !(OVERSCAN_LINES..LAST_VISIBLE_LINE).contains(&line) {
            return Ok(());
        }

        let row_index = self.fb.row_offset(line - OVERSCAN_LINES);
        let border = argb(regs.border_colour());

        let shrink = if regs.wide_border_vertical() {
            WIDE_BORDER_ROWS
        } else {
            0
        };
        let in_window =
            line >= WINDOW_FIRST_LINE + shrink && line < WINDOW_END_LINE - shrink;

        if in_window && regs.screen_enabled() {
            let content_offset = row_index + BORDER_WIDTH;
            let content_row = line - WINDOW_FIRST_LINE;
            let sprite_line = content_row + SPRITE_Y_OFFSET;
            let (_, matrix, _) = self.addresses;

            self.mode.backfill(regs, &mut self.fb, content_offset);
            self.sprites
                .raster_back_into(matrix, row_index, sprite_line, &mut self.fb);
            self.mode
                .raster_content(regs, &*self.memory, &mut self.fb, content_offset, content_row)?;
            self.sprites
                .raster_front_into(row_index, sprite_line, &mut self.fb);

            let (extra_left, extra_right) = if regs.wide_border_horizontal() {
                (WIDE_BORDER_LEFT, WIDE_BORDER_RIGHT)
            } else {
                (0, 0)
            };
            self.fb
                .fill(row_index..row_index + BORDER_WIDTH + extra_left, border);
            self.fb.fill(
                row_index + BORDER_WIDTH + CONTENT_WIDTH - extra_right
                    ..row_index + DISPLAY_WIDTH,
                border,
            );
        } else {
            self.fb.fill(row_index..row_index + DISPLAY_WIDTH, border);
        }

        if self.diagnostic_overlay {
            self.draw_overlay(row_index, interrupt_line, bad_line);
        }

        Ok(())
    }

    /// Diagnostic marker pixels at the line start: active mode's debug
    /// colour, then interrupt and bad-line indicators, separated by black.
    fn draw_overlay(&mut self, row_index: usize, interrupt_line: bool, bad_line: bool) {
        let marker = |on: bool| PALETTE[if on { WHITE } else { BLACK }];
        self.fb.set(row_index, argb(self.mode.debug_colour()));
        self.fb.set(row_index + 1, PALETTE[BLACK]);
        self.fb.set(row_index + 2, marker(interrupt_line));
        self.fb.set(row_index + 3, PALETTE[BLACK]);
        self.fb.set(row_index + 4, marker(bad_line));
        self.fb.set(row_index + 5, PALETTE[BLACK]);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RasterState> {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Cloneable handle carrying the operations callable from outside the
/// rendering thread.
#[derive(Clone)]
pub struct RasterHandle {
    shared: Arc<Shared>,
    registers: Arc<Mutex<RegisterFile>>,
}

impl RasterHandle {
    /// Atomically update the three address registers and schedule a
    /// re-prime of the active mode.
    pub fn set_addresses(&self, charset: u16, matrix: u16, bitmap: u16) {
        self.lock_state().set_addresses(charset, matrix, bitmap);
    }

    /// Resolve the mode-select flags and stage the result for the next bad
    /// line. The swap never happens immediately: real programs pre-stage
    /// mode changes timed to bad lines.
    pub fn set_video_mode(&self, bitmap: bool, extended: bool, multi: bool) {
        let variant = ModeVariant::resolve(bitmap, extended, multi);
        trace!("mode {variant:?} staged");
        self.lock_state().schedule_mode(variant);
    }

    /// Request a cooperative stop, honoured at the next line boundary.
    pub fn terminate(&self) {
        self.shared.stop.store(true, Ordering::Relaxed);
    }

    /// The line currently being rendered.
    #[must_use]
    pub fn current_raster_line(&self) -> u16 {
        self.lock_state().current_line()
    }

    /// The mode rendering right now (staged switches not included).
    #[must_use]
    pub fn current_mode(&self) -> ModeVariant {
        self.lock_state().current_mode()
    }

    /// One-shot readiness signal from the presentation side; triggers the
    /// engine's first clock-resume.
    pub fn presentation_ready(&self) {
        self.shared.present_ready.store(true, Ordering::Release);
    }

    /// Read a register as the CPU-facing bus: the raster offset reports the
    /// current line, everything else its stored byte.
    #[must_use]
    pub fn read_register(&self, offset: usize) -> u8 {
        let line = self.current_raster_line();
        self.registers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .read(offset, line)
    }

    /// Write a register byte.
    pub fn write_register(&self, offset: usize, value: u8) {
        self.registers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .write(offset, value);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RasterState> {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
