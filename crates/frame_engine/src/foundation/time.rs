//! Time management utilities
//!
//! [`Time`] is the simulation clock handed to behaviours. [`Timer`] and
//! [`Stopwatch`] measure wall-clock time for the frame driver and statistics.

use std::time::{Duration, Instant};

/// Simulation clock for the current frame
///
/// While a fixed step is running, [`Time::delta_time`] reports the fixed step
/// length instead of the frame delta.
#[derive(Debug, Clone)]
pub struct Time {
    delta_time: f32,
    unscaled_delta_time: f32,
    fixed_delta_time: f32,
    time: f64,
    unscaled_time: f64,
    fixed_time: f64,
    time_scale: f32,
    frame_count: u64,
    in_fixed_step: bool,
}

impl Default for Time {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}

impl Time {
    /// Create a clock with the given fixed step length
    pub fn new(fixed_delta_time: f32) -> Self {
        Self {
            delta_time: 0.0,
            unscaled_delta_time: 0.0,
            fixed_delta_time,
            time: 0.0,
            unscaled_time: 0.0,
            fixed_time: 0.0,
            time_scale: 1.0,
            frame_count: 0,
            in_fixed_step: false,
        }
    }

    /// Start a new frame with the measured (unscaled) delta; returns the scaled delta
    pub fn begin_frame(&mut self, unscaled_delta: f32) -> f32 {
        self.unscaled_delta_time = unscaled_delta.max(0.0);
        self.delta_time = self.unscaled_delta_time * self.time_scale;
        self.unscaled_time += f64::from(self.unscaled_delta_time);
        self.time += f64::from(self.delta_time);
        self.frame_count += 1;
        self.delta_time
    }

    /// Mark the start of one fixed step
    pub fn enter_fixed_step(&mut self) {
        self.in_fixed_step = true;
    }

    /// Mark the end of one fixed step and advance fixed time
    pub fn exit_fixed_step(&mut self) {
        self.in_fixed_step = false;
        self.fixed_time += f64::from(self.fixed_delta_time);
    }

    /// Scaled delta of the current frame, or the fixed step inside FixedUpdate
    pub fn delta_time(&self) -> f32 {
        if self.in_fixed_step {
            self.fixed_delta_time
        } else {
            self.delta_time
        }
    }

    /// Delta of the current frame before `time_scale`
    pub fn unscaled_delta_time(&self) -> f32 {
        self.unscaled_delta_time
    }

    /// Fixed step length in seconds
    pub fn fixed_delta_time(&self) -> f32 {
        self.fixed_delta_time
    }

    /// Change the fixed step length
    pub fn set_fixed_delta_time(&mut self, fixed_delta_time: f32) {
        self.fixed_delta_time = fixed_delta_time;
    }

    /// Scaled time since start
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Unscaled time since start
    pub fn unscaled_time(&self) -> f64 {
        self.unscaled_time
    }

    /// Simulated time consumed by completed fixed steps
    pub fn fixed_time(&self) -> f64 {
        self.fixed_time
    }

    /// Multiplier applied to frame deltas
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Set the multiplier applied to frame deltas; negative values clamp to zero
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Number of frames started so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// True while a fixed step is running
    pub fn in_fixed_step(&self) -> bool {
        self.in_fixed_step
    }
}

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the average FPS since timer creation
    #[allow(clippy::cast_precision_loss)]
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        self.elapsed + self.start_time.map_or(Duration::ZERO, |start| start.elapsed())
    }

    /// Get the elapsed time in whole microseconds
    pub fn elapsed_micros(&self) -> u64 {
        u64::try_from(self.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}
