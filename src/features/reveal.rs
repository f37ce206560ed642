use crate::app::PageEvent;
use crate::config::{EffectKind, ElementConfig};
use crate::features::Feature;
use crate::gfx::math::{Rect, Vec2};
use crate::scheduler::Scheduler;
use crate::surface::{ElementId, Surface};
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerOptions {
    /// Fraction of the element box that must be visible. Zero fires on any
    /// overlap.
    pub threshold: f32,
    /// Pixels cut from the bottom of the viewport, so triggers fire a little
    /// before the element reaches the bottom edge.
    pub bottom_margin: f32,
}

impl TriggerOptions {
    pub const REVEAL: TriggerOptions = TriggerOptions {
        threshold: 0.1,
        bottom_margin: 50.0,
    };

    pub fn with_threshold(self, threshold: Option<f32>) -> Self {
        Self {
            threshold: threshold.unwrap_or(self.threshold),
            ..self
        }
    }
}

pub fn visible_fraction(rect: Rect, viewport: Vec2, bottom_margin: f32) -> f32 {
    let band = Rect::new(0.0, 0.0, viewport.x, (viewport.y - bottom_margin).max(0.0));
    let area = rect.area();
    if area <= 0.0 {
        return if band.contains(rect.origin()) { 1.0 } else { 0.0 };
    }
    rect.intersection(&band)
        .map(|i| (i.area() / area).min(1.0))
        .unwrap_or(0.0)
}

fn crosses(fraction: f32, threshold: f32) -> bool {
    if threshold <= 0.0 {
        fraction > 0.0
    } else {
        fraction >= threshold
    }
}

/// Watch set sharing one set of options. Each registration fires at most
/// once and leaves the set when it does.
#[derive(Debug)]
pub struct TriggerGroup<A> {
    options: TriggerOptions,
    watch: Vec<(ElementId, A)>,
}

impl<A> TriggerGroup<A> {
    pub fn new(options: TriggerOptions) -> Self {
        Self {
            options,
            watch: Vec::new(),
        }
    }

    pub fn options(&self) -> TriggerOptions {
        self.options
    }

    /// An element may be registered several times; every action fires.
    pub fn register(&mut self, element: ElementId, action: A) {
        self.watch.push((element, action));
    }

    pub fn is_watching(&self, element: ElementId) -> bool {
        self.watch.iter().any(|(e, _)| *e == element)
    }

    pub fn len(&self) -> usize {
        self.watch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watch.is_empty()
    }

    /// Returns the actions of every element that crossed the threshold,
    /// in registration order, and drops those registrations.
    pub fn observe(&mut self, surface: &dyn Surface) -> Vec<(ElementId, A)> {
        let viewport = surface.viewport();
        let options = self.options;
        let (fired, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.watch).into_iter().partition(|(element, _)| {
                surface.bounding_rect(*element).is_some_and(|rect| {
                    crosses(visible_fraction(rect, viewport, options.bottom_margin), options.threshold)
                })
            });
        self.watch = kept;
        fired
    }
}

#[derive(Debug)]
pub struct Triggers<A> {
    groups: Vec<TriggerGroup<A>>,
    supported: bool,
}

impl<A> Triggers<A> {
    pub fn new(surface: &dyn Surface) -> Self {
        let supported = surface.supports_intersection();
        if !supported {
            warn!("Visibility observation unavailable, scroll-triggered effects are disabled");
        }
        Self {
            groups: Vec::new(),
            supported,
        }
    }

    /// Returns false when the surface cannot observe visibility; the
    /// element is then left alone.
    pub fn register(&mut self, element: ElementId, options: TriggerOptions, action: A) -> bool {
        if !self.supported {
            return false;
        }
        let idx = match self.groups.iter().position(|g| g.options() == options) {
            Some(idx) => idx,
            None => {
                self.groups.push(TriggerGroup::new(options));
                self.groups.len() - 1
            }
        };
        self.groups[idx].register(element, action);
        true
    }

    pub fn observe(&mut self, surface: &dyn Surface) -> Vec<(ElementId, A)> {
        self.groups
            .iter_mut()
            .flat_map(|g| g.observe(surface))
            .collect()
    }

    pub fn watching(&self) -> usize {
        self.groups.iter().map(TriggerGroup::len).sum()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

const DEFAULT_REVEAL_DURATION_MS: f64 = 600.0;
const DEFAULT_LIST_STAGGER_MS: f64 = 100.0;
pub const ENTRANCE_STAGGER_MS: f64 = 200.0;

#[derive(Debug, Clone, PartialEq)]
enum RevealAction {
    Animate { animation: String, duration_ms: f64 },
    AddClass(String),
}

#[derive(Debug)]
struct Delayed {
    element: ElementId,
    delay_ms: f64,
    action: RevealAction,
}

/// Entrance animations: `animate-*` reveals, staggered group reveals,
/// scroll markers, staggered lists and the hero entrance.
pub struct RevealController {
    triggers: Triggers<Delayed>,
    pending: Scheduler<(ElementId, RevealAction)>,
}

impl RevealController {
    pub fn new(surface: &dyn Surface) -> Self {
        Self {
            triggers: Triggers::new(surface),
            pending: Scheduler::new(),
        }
    }

    /// `index` is the element's position within its stagger group.
    pub fn register(
        &mut self,
        element: ElementId,
        config: &ElementConfig,
        index: usize,
        surface: &mut dyn Surface,
    ) {
        let options = TriggerOptions::REVEAL.with_threshold(config.threshold);
        let (action, delay_ms) = match &config.kind {
            EffectKind::Reveal { animation } => (
                RevealAction::Animate {
                    animation: animation.clone(),
                    duration_ms: config.duration_ms.unwrap_or(DEFAULT_REVEAL_DURATION_MS),
                },
                config.delay_ms,
            ),
            EffectKind::StaggerReveal { class } => (
                RevealAction::AddClass(class.clone()),
                config.delay_ms + index as f64 * config.stagger_ms.unwrap_or(0.0),
            ),
            EffectKind::ScrollMarker => (RevealAction::AddClass("aos-animate".to_string()), config.delay_ms),
            EffectKind::StaggerList => {
                let step = config.stagger_ms.unwrap_or(DEFAULT_LIST_STAGGER_MS);
                for (i, item) in surface.children(element).into_iter().enumerate() {
                    surface.set_style(item, "animation-delay", &format!("{}ms", i as f64 * step));
                    surface.add_class(item, "stagger-item");
                }
                return;
            }
            _ => return,
        };
        self.triggers.register(element, options, Delayed { element, delay_ms, action });
    }

    /// Page-load entrance for hero content, 200 ms apart.
    pub fn play_entrance(&mut self, now: f64, elements: &[ElementId]) {
        for (i, element) in elements.iter().enumerate() {
            self.pending.schedule_after(
                now,
                i as f64 * ENTRANCE_STAGGER_MS,
                (*element, RevealAction::AddClass("entrance-animate".to_string())),
            );
        }
    }

    pub fn watching(&self) -> usize {
        self.triggers.watching()
    }

    fn apply(element: ElementId, action: RevealAction, surface: &mut dyn Surface) {
        match action {
            RevealAction::Animate { animation, duration_ms } => {
                surface.add_class(element, "animated");
                surface.add_class(element, &format!("animate-{}", animation));
                surface.set_style(element, "animation-duration", &format!("{}ms", duration_ms));
            }
            RevealAction::AddClass(class) => surface.add_class(element, &class),
        }
    }
}

impl Feature for RevealController {
    fn name(&self) -> &'static str {
        "reveal"
    }

    fn update(&mut self, now: f64, surface: &mut dyn Surface) {
        for (element, delayed) in self.triggers.observe(surface) {
            debug!("reveal triggered for {}", element);
            self.pending
                .schedule_after(now, delayed.delay_ms, (delayed.element, delayed.action));
        }
        for (element, action) in self.pending.drain_due(now) {
            Self::apply(element, action, surface);
        }
    }

    fn handle_event(&mut self, _event: &PageEvent, _now: f64, _surface: &mut dyn Surface) -> bool {
        false
    }

    fn is_animating(&self) -> bool {
        !self.pending.is_empty()
    }

    fn teardown(&mut self, _surface: &mut dyn Surface) {
        if !self.pending.is_empty() {
            info!("Dropping {} pending reveals", self.pending.len());
        }
        self.pending.clear();
    }
}
