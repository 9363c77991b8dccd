/// One sample of the live WPM curve, taken at a whole-second boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WpmSample {
    /// Seconds since the session started.
    pub t: u64,
    pub wpm: f64,
}

impl WpmSample {
    pub fn new(t: u64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<(u64, f64)> for WpmSample {
    fn from(v: (u64, f64)) -> Self {
        WpmSample { t: v.0, wpm: v.1 }
    }
}

impl From<WpmSample> for (f64, f64) {
    fn from(p: WpmSample) -> Self {
        (p.t as f64, p.wpm)
    }
}
