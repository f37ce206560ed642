use crate::app::PageEvent;
use crate::features::reveal::{TriggerOptions, Triggers};
use crate::features::Feature;
use crate::gfx::anim::{ease_out_cubic, ease_out_quart, Tween};
use crate::surface::{ElementId, Surface};
use log::debug;

pub const COUNTER_DURATION_MS: f64 = 2000.0;
pub const PROGRESS_DURATION_MS: f64 = 1500.0;

const COUNTER_TRIGGER: TriggerOptions = TriggerOptions {
    threshold: 0.5,
    bottom_margin: 50.0,
};
const PROGRESS_TRIGGER: TriggerOptions = TriggerOptions {
    threshold: 0.3,
    bottom_margin: 0.0,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Meter {
    Counter,
    Progress,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    meter: Meter,
    start: f64,
    target: f64,
    duration_ms: f64,
}

struct Running {
    element: ElementId,
    meter: Meter,
    tween: Tween,
}

/// Formats an integer with `,` thousands separators.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub struct CounterController {
    triggers: Triggers<Pending>,
    running: Vec<Running>,
}

impl CounterController {
    pub fn new(surface: &dyn Surface) -> Self {
        Self {
            triggers: Triggers::new(surface),
            running: Vec::new(),
        }
    }

    pub fn register_counter(
        &mut self,
        element: ElementId,
        start: i64,
        target: i64,
        duration_ms: Option<f64>,
        threshold: Option<f32>,
    ) {
        self.triggers.register(
            element,
            COUNTER_TRIGGER.with_threshold(threshold),
            Pending {
                meter: Meter::Counter,
                start: start as f64,
                target: target as f64,
                duration_ms: duration_ms.unwrap_or(COUNTER_DURATION_MS),
            },
        );
    }

    pub fn register_progress(
        &mut self,
        element: ElementId,
        percent: f32,
        duration_ms: Option<f64>,
        threshold: Option<f32>,
    ) {
        self.triggers.register(
            element,
            PROGRESS_TRIGGER.with_threshold(threshold),
            Pending {
                meter: Meter::Progress,
                start: 0.0,
                target: percent.clamp(0.0, 100.0) as f64,
                duration_ms: duration_ms.unwrap_or(PROGRESS_DURATION_MS),
            },
        );
    }

    fn write(meter: Meter, element: ElementId, value: f64, surface: &mut dyn Surface) {
        match meter {
            Meter::Counter => surface.set_text(element, &format_thousands(value.floor() as i64)),
            Meter::Progress => surface.set_style(element, "width", &format!("{}%", value)),
        }
    }
}

impl Feature for CounterController {
    fn name(&self) -> &'static str {
        "counters"
    }

    fn update(&mut self, now: f64, surface: &mut dyn Surface) {
        for (element, p) in self.triggers.observe(surface) {
            debug!("{:?} {} started towards {}", p.meter, element, p.target);
            let easing = match p.meter {
                Meter::Counter => ease_out_quart,
                Meter::Progress => ease_out_cubic,
            };
            self.running.push(Running {
                element,
                meter: p.meter,
                tween: Tween::new(p.start, p.target, p.duration_ms, easing).starting_at(now),
            });
        }

        self.running.retain_mut(|run| {
            let sample = run.tween.sample(now);
            Self::write(run.meter, run.element, sample.value, surface);
            !sample.done
        });
    }

    fn handle_event(&mut self, _event: &PageEvent, _now: f64, _surface: &mut dyn Surface) -> bool {
        false
    }

    fn is_animating(&self) -> bool {
        !self.running.is_empty()
    }
}
