//! Timer seam plus the scroll rate limiters built on it.

/// Source of time and one-shot timers. Dropping a `Pending` cancels it.
pub trait Timers: Clone + 'static {
    type Pending: 'static;

    fn now(&self) -> f64;
    fn schedule(&self, millis: u32, callback: Box<dyn FnOnce()>) -> Self::Pending;
}

/// Leading-edge throttle: the first call runs, calls inside the window after
/// it are dropped.
#[derive(Debug, Clone)]
pub struct Throttle {
    window_ms: f64,
    last_run: Option<f64>,
}

impl Throttle {
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_ms: f64::from(window_ms),
            last_run: None,
        }
    }

    pub fn admit(&mut self, now: f64) -> bool {
        match self.last_run {
            Some(last) if now - last < self.window_ms => false,
            _ => {
                self.last_run = Some(now);
                true
            }
        }
    }

    /// Records a run that happened outside `admit`, opening a new window.
    pub fn mark(&mut self, now: f64) {
        self.last_run = Some(now);
    }
}

/// Runs only the latest call, once `wait_ms` passes without another one.
pub struct Debounce<T: Timers> {
    timers: T,
    wait_ms: u32,
    pending: Option<T::Pending>,
}

impl<T: Timers> Debounce<T> {
    pub fn new(timers: T, wait_ms: u32) -> Self {
        Self {
            timers,
            wait_ms,
            pending: None,
        }
    }

    pub fn call(&mut self, callback: impl FnOnce() + 'static) {
        // replacing the handle cancels the previous call
        self.pending = Some(self.timers.schedule(self.wait_ms, Box::new(callback)));
    }
}
