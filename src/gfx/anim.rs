/// Maps normalized time progress in `[0, 1]` to eased progress.
pub type Easing = fn(f64) -> f64;

pub fn linear(t: f64) -> f64 {
    t
}

pub fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

pub fn ease_out_quart(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(4)
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[derive(Debug, Clone)]
pub struct Timeline {
    pub start_time: f64,
    pub duration: f64,
    pub current_time: f64,
}

impl Timeline {
    pub fn new(duration: f64) -> Self {
        Self {
            start_time: 0.0,
            duration,
            current_time: 0.0,
        }
    }

    pub fn start(&mut self, now: f64) {
        self.start_time = now;
        self.current_time = now;
    }

    /// Advances the clock. A timestamp older than the last one is ignored so
    /// progress never runs backwards.
    pub fn update(&mut self, now: f64) {
        if now > self.current_time {
            self.current_time = now;
        }
    }

    /// Zero, negative and NaN durations count as already finished.
    pub fn progress(&self) -> f64 {
        if !(self.duration > 0.0) {
            return 1.0;
        }
        let elapsed = self.current_time - self.start_time;
        (elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn eased_progress(&self, easing: Easing) -> f64 {
        easing(self.progress())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub progress: f64,
    pub done: bool,
}

/// A value travelling from `start` to `target` over a fixed duration.
///
/// Once the timeline completes, every sample is exactly `target`; the last
/// interpolated frame never leaves rounding drift behind.
#[derive(Debug, Clone)]
pub struct Tween {
    start: f64,
    target: f64,
    timeline: Timeline,
    easing: Easing,
}

impl Tween {
    pub fn new(start: f64, target: f64, duration_ms: f64, easing: Easing) -> Self {
        Self {
            start,
            target,
            timeline: Timeline::new(duration_ms),
            easing,
        }
    }

    pub fn starting_at(mut self, now: f64) -> Self {
        self.timeline.start(now);
        self
    }

    pub fn is_complete(&self) -> bool {
        self.timeline.is_complete()
    }

    pub fn sample(&mut self, now: f64) -> Sample {
        self.timeline.update(now);
        let progress = self.timeline.progress();
        if progress >= 1.0 {
            return Sample {
                value: self.target,
                progress: 1.0,
                done: true,
            };
        }
        Sample {
            value: lerp(self.start, self.target, (self.easing)(progress)),
            progress,
            done: false,
        }
    }

    pub fn run(mut self, step_ms: f64) -> Vec<f64> {
        let step = if step_ms > 0.0 { step_ms } else { 16.0 };
        let mut now = self.timeline.start_time;
        let mut values = Vec::new();
        loop {
            let sample = self.sample(now);
            values.push(sample.value);
            if sample.done {
                return values;
            }
            now += step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(linear)]
    #[case(ease_in_out)]
    #[case(ease_out_cubic)]
    #[case(ease_out_quart)]
    fn easings_are_anchored(#[case] easing: Easing) {
        assert_eq!(easing(0.0), 0.0);
        assert!((easing(1.0) - 1.0).abs() < 1e-12);
        let mid = easing(0.5);
        assert!((0.0..=1.0).contains(&mid));
    }

    #[rstest]
    #[case(linear, 1000.0)]
    #[case(ease_out_quart, 2000.0)]
    #[case(ease_out_cubic, 1500.0)]
    #[case(ease_in_out, 333.3)]
    fn last_value_is_exactly_target(#[case] easing: Easing, #[case] duration: f64) {
        let target = 1234.567_f64;
        let values = Tween::new(0.1, target, duration, easing).starting_at(5.0).run(16.0);
        assert_eq!(*values.last().unwrap(), target);
        assert!(values.len() > 2);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-50.0)]
    #[case(f64::NAN)]
    fn malformed_duration_snaps_to_target(#[case] duration: f64) {
        let mut tween = Tween::new(0.0, 42.0, duration, ease_out_cubic).starting_at(100.0);
        let sample = tween.sample(100.0);
        assert!(sample.done);
        assert_eq!(sample.value, 42.0);
    }

    #[test]
    fn progress_never_regresses() {
        let mut tween = Tween::new(0.0, 10.0, 1000.0, linear).starting_at(0.0);
        let first = tween.sample(600.0);
        let second = tween.sample(200.0);
        assert!(second.progress >= first.progress);
        assert_eq!(second.value, first.value);
    }

    #[test]
    fn timeline_progress_is_clamped() {
        let mut tl = Timeline::new(100.0);
        tl.start(50.0);
        tl.update(25.0);
        assert_eq!(tl.progress(), 0.0);
        tl.update(500.0);
        assert_eq!(tl.progress(), 1.0);
        assert!(tl.is_complete());
        assert_eq!(tl.eased_progress(ease_out_quart), 1.0);
    }
}
