use std::time::{Duration, Instant};

/// Wall clock stopwatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timer {
    start: Instant,
    stop: Option<Instant>
}

impl Timer {
    #[inline(always)]
    pub fn start () -> Self {
        Self { start: Instant::now(), stop: None }
    }

    #[inline(always)]
    pub fn restart (&mut self) {
        *self = Self::start()
    }

    /// Stops the timer and returns the elapsed milliseconds. Later calls keep the first stop time.
    #[inline(always)]
    pub fn stop (&mut self) -> f64 {
        self.ms()
    }

    /// Elapsed milliseconds. Stops the timer if it is still running.
    #[inline]
    pub fn ms (&mut self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }

    #[inline]
    pub fn elapsed (&mut self) -> Duration {
        let stop = *self.stop.get_or_insert_with(Instant::now);
        stop.duration_since(self.start)
    }
}
