//! Threaded contract: the engine on its own thread, a CPU-like participant
//! on another, both paced by the shared clock.

use std::sync::{Arc, Mutex};

use emu_clock::Clock;
use mos_vic_raster::geometry::{CYCLES_PER_LINE, TOTAL_LINES};
use mos_vic_raster::{
    EngineConfig, FrameBuffer, FrameSink, NoInterrupt, NoSprites, RasterEngine, RegisterFile,
    SimpleRam, registers,
};

struct CountingSink {
    frames: Arc<Mutex<u32>>,
}

impl FrameSink for CountingSink {
    fn frame_ready(&mut self, frame: &FrameBuffer) {
        // Complete frames only: every pixel of a published frame was painted
        // this pass (all border colour here, screen is off).
        assert!(frame.pixels().iter().all(|&px| px == frame.pixels()[0]));
        *self.frames.lock().unwrap() += 1;
    }
}

#[test]
fn engine_and_cpu_participant_run_in_lockstep() {
    let clock = Clock::new();
    let frames = Arc::new(Mutex::new(0));

    let engine = RasterEngine::new(
        EngineConfig {
            memory: Arc::new(SimpleRam::new()),
            registers: Arc::new(Mutex::new(RegisterFile::new())),
            sprites: Box::new(NoSprites),
            sink: Box::new(CountingSink {
                frames: Arc::clone(&frames),
            }),
            interrupt: Box::new(NoInterrupt),
            diagnostic_overlay: false,
        },
        &clock,
    );
    let handle = engine.handle();
    handle.write_register(registers::BORDER_COLOUR, 6);

    let cpu = clock.register();
    let join = engine.spawn();

    // Until the sink is ready the engine free-runs without constraining us.
    cpu.prepare();
    cpu.advance(CYCLES_PER_LINE);

    handle.presentation_ready();

    // Three frames of CPU time; the engine must keep pace, never running a
    // full frame ahead or behind once participation resumed.
    let frame_cycles = TOTAL_LINES as u64 * CYCLES_PER_LINE;
    for _ in 0..3 * TOTAL_LINES {
        cpu.advance(CYCLES_PER_LINE);
    }
    assert!(cpu.cycles() >= 3 * frame_cycles);

    handle.terminate();
    // Dropping our participation releases the engine if it is blocked in
    // advance(), letting it reach the next line boundary and stop.
    drop(cpu);
    join.join().expect("engine thread exited cleanly");

    assert!(
        *frames.lock().unwrap() >= 1,
        "at least one complete frame was published"
    );
}
