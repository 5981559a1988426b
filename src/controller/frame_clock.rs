use std::time::{Duration, Instant};

/// Monotonic millisecond tick source.
pub trait WallClock {
    fn now_millis(&self) -> u64;

    /// Called while the frame clock waits out the rest of a frame.
    fn pause(&self, _remaining_millis: u64) {
        std::hint::spin_loop();
    }
}

/// How [`SystemClock`] burns the remainder of a short frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitStrategy {
    /// Busy-wait on the loop thread. Lowest wake-up jitter, one core at 100%.
    Spin,
    /// Sleep for the remaining milliseconds. Wake-up may overshoot slightly.
    #[default]
    Sleep,
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
    strategy: WaitStrategy,
}

impl SystemClock {
    pub fn new(strategy: WaitStrategy) -> Self {
        Self {
            origin: Instant::now(),
            strategy,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(WaitStrategy::default())
    }
}

impl WallClock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn pause(&self, remaining_millis: u64) {
        match self.strategy {
            WaitStrategy::Spin => std::hint::spin_loop(),
            WaitStrategy::Sleep => std::thread::sleep(Duration::from_millis(remaining_millis)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSettings {
    /// Frames shorter than this are stretched by waiting (16 ms is roughly 60 Hz).
    pub min_frame_millis: u64,
    /// Upper bound on the delta handed to the simulation.
    pub max_delta_seconds: f32,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            min_frame_millis: 16,
            max_delta_seconds: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    pub last_tick_millis: u64,
    pub delta_seconds: f32,
}

/// Fixed-minimum-interval frame pacing.
///
/// Fast frames are throttled up to `min_frame_millis`; slow frames are not
/// sped up, only their delta is clamped to `max_delta_seconds`. There is no
/// step accumulator.
#[derive(Debug)]
pub struct FrameClock<C: WallClock = SystemClock> {
    clock: C,
    settings: TimingSettings,
    timing: FrameTiming,
}

impl<C: WallClock> FrameClock<C> {
    pub fn new(clock: C, settings: TimingSettings) -> Self {
        let now = clock.now_millis();
        Self {
            clock,
            settings,
            timing: FrameTiming {
                last_tick_millis: now,
                delta_seconds: 0.0,
            },
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn settings(&self) -> &TimingSettings {
        &self.settings
    }

    pub fn timing(&self) -> FrameTiming {
        self.timing
    }

    /// Blocks until the minimum frame time has passed, then returns the
    /// clamped delta in seconds.
    pub fn tick(&mut self) -> f32 {
        let deadline = self.timing.last_tick_millis + self.settings.min_frame_millis;
        let mut now = self.clock.now_millis();
        while now < deadline {
            self.clock.pause(deadline - now);
            now = self.clock.now_millis();
        }

        let raw = (now - self.timing.last_tick_millis) as f32 / 1000.0;
        let delta = if raw > self.settings.max_delta_seconds {
            tracing::debug!(raw, clamped = self.settings.max_delta_seconds, "frame stall, clamping delta");
            self.settings.max_delta_seconds
        } else {
            raw
        };

        self.timing = FrameTiming {
            last_tick_millis: now,
            delta_seconds: delta,
        };
        delta
    }

    /// Forgets time spent outside the loop, e.g. while the window was hidden.
    pub fn restart(&mut self) {
        self.timing.last_tick_millis = self.clock.now_millis();
    }
}

impl Default for FrameClock<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock::default(), TimingSettings::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    /// Deterministic clock: time only moves when told to, or by 1 ms per pause.
    #[derive(Debug, Default)]
    pub(crate) struct ManualClock {
        now: Cell<u64>,
        pauses: Cell<u32>,
    }

    impl ManualClock {
        pub(crate) fn advance(&self, millis: u64) {
            self.now.set(self.now.get() + millis);
        }
    }

    impl WallClock for ManualClock {
        fn now_millis(&self) -> u64 {
            self.now.get()
        }

        fn pause(&self, _remaining_millis: u64) {
            self.pauses.set(self.pauses.get() + 1);
            self.advance(1);
        }
    }

    fn manual() -> FrameClock<ManualClock> {
        FrameClock::new(ManualClock::default(), TimingSettings::default())
    }

    #[test]
    fn immediate_ticks_wait_out_the_minimum() {
        let mut frames = manual();
        let first = frames.tick();
        let after_first = frames.timing().last_tick_millis;
        let second = frames.tick();

        assert_eq!(after_first, 16);
        assert_eq!(frames.timing().last_tick_millis, 32);
        assert_eq!(first, 0.016);
        assert_eq!(second, 0.016);
        assert_eq!(frames.clock().pauses.get(), 32);
    }

    #[test]
    fn stall_is_clamped_exactly() {
        let mut frames = manual();
        frames.clock().advance(500);
        let delta = frames.tick();

        assert_eq!(delta, 0.05);
        assert_eq!(frames.clock().pauses.get(), 0);
        assert_eq!(frames.timing().last_tick_millis, 500);
    }

    #[test]
    fn delta_never_exceeds_cap() {
        let mut frames = manual();
        for stall in [0, 3, 16, 17, 49, 50, 51, 120, 10_000] {
            frames.clock().advance(stall);
            let delta = frames.tick();
            assert!(delta <= 0.05, "stall {stall} gave {delta}");
            assert!(delta >= 0.016, "stall {stall} gave {delta}");
        }
    }

    #[test]
    fn slow_frames_are_not_sped_up() {
        let mut frames = manual();
        frames.clock().advance(30);
        assert_eq!(frames.tick(), 0.03);
        assert_eq!(frames.clock().pauses.get(), 0);
    }

    #[test]
    fn restart_skips_hidden_time() {
        let mut frames = manual();
        frames.clock().advance(400);
        frames.restart();
        frames.clock().advance(20);
        assert_eq!(frames.tick(), 0.02);
    }

    #[test]
    fn system_clock_paces_back_to_back_ticks() {
        let mut frames = FrameClock::new(SystemClock::new(WaitStrategy::Spin), TimingSettings::default());
        frames.tick();
        let start = Instant::now();
        let delta = frames.tick();

        // Millisecond truncation can shave at most one millisecond off the wall time.
        assert!(start.elapsed() >= Duration::from_millis(15));
        assert!(delta >= 0.016 && delta <= 0.05);
    }
}
