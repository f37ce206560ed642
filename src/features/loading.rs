use crate::app::PageEvent;
use crate::features::reveal::ENTRANCE_STAGGER_MS;
use crate::features::Feature;
use crate::gfx::transform::Transform;
use crate::scheduler::Scheduler;
use crate::storage::PreferenceStorage;
use crate::surface::{ElementId, Surface};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SESSION_KEY: &str = "visited";
pub const PROGRESS_STEP_MS: f64 = 50.0;
pub const FADE_DELAY_MS: f64 = 500.0;
pub const REMOVE_DELAY_MS: f64 = 500.0;

const BACKDROP: &str = "linear-gradient(135deg, #000000 0%, #1a1a1a 50%, #2d2d2d 100%)";

/// Marks the session as visited and reports whether this is the first
/// visit. Unreadable session storage counts as a first visit.
pub fn first_visit(session: &mut dyn PreferenceStorage) -> bool {
    match session.get(SESSION_KEY) {
        Ok(Some(_)) => false,
        Ok(None) => {
            if let Err(e) = session.set(SESSION_KEY, "true") {
                warn!("Could not mark session as visited: {}", e);
            }
            true
        }
        Err(e) => {
            warn!("Session storage unavailable: {}", e);
            true
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Progress,
    Fade,
    Remove,
    Entrance(ElementId),
}

pub struct LoadingScreen {
    title: String,
    hero: Vec<ElementId>,
    screen: Option<ElementId>,
    bar: Option<ElementId>,
    progress: f32,
    rng: StdRng,
    stages: Scheduler<Stage>,
}

impl LoadingScreen {
    pub fn new(title: &str, hero: Vec<ElementId>) -> Self {
        Self::with_rng(title, hero, StdRng::from_entropy())
    }

    pub fn with_seed(title: &str, hero: Vec<ElementId>, seed: u64) -> Self {
        Self::with_rng(title, hero, StdRng::seed_from_u64(seed))
    }

    fn with_rng(title: &str, hero: Vec<ElementId>, rng: StdRng) -> Self {
        Self {
            title: title.to_string(),
            hero,
            screen: None,
            bar: None,
            progress: 0.0,
            rng,
            stages: Scheduler::new(),
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_showing(&self) -> bool {
        self.screen.is_some()
    }

    /// Builds the overlay and starts filling the bar.
    pub fn show(&mut self, now: f64, surface: &mut dyn Surface) {
        let screen = surface.create_node(surface.root(), "div");
        surface.add_class(screen, "loading-screen");
        for (property, value) in [
            ("position", "fixed"),
            ("top", "0"),
            ("left", "0"),
            ("width", "100%"),
            ("height", "100%"),
            ("background", BACKDROP),
            ("display", "flex"),
            ("align-items", "center"),
            ("justify-content", "center"),
            ("z-index", "9999"),
            ("color", "white"),
        ] {
            surface.set_style(screen, property, value);
        }

        let content = surface.create_node(screen, "div");
        surface.add_class(content, "loading-content");
        let logo = surface.create_node(content, "div");
        surface.add_class(logo, "loading-logo");
        let text = surface.create_node(logo, "span");
        surface.add_class(text, "loading-text");
        surface.set_text(text, &self.title);
        let track = surface.create_node(content, "div");
        surface.add_class(track, "loading-bar");
        let bar = surface.create_node(track, "div");
        surface.add_class(bar, "loading-progress");

        self.screen = Some(screen);
        self.bar = Some(bar);
        self.progress = 0.0;
        self.stages.schedule(now, Stage::Progress);
        info!("Loading screen shown");
    }

    fn run(&mut self, stage: Stage, now: f64, surface: &mut dyn Surface) {
        match stage {
            Stage::Progress => {
                self.progress += self.rng.gen_range(0.0..3.0);
                if let Some(bar) = self.bar {
                    surface.set_style(bar, "width", &format!("{}%", self.progress.min(100.0)));
                }
                if self.progress < 100.0 {
                    self.stages.schedule_after(now, PROGRESS_STEP_MS, Stage::Progress);
                } else {
                    debug!("loading complete");
                    self.stages.schedule_after(now, FADE_DELAY_MS, Stage::Fade);
                }
            }
            Stage::Fade => {
                if let Some(screen) = self.screen {
                    surface.set_style(screen, "opacity", "0");
                    surface.set_style(screen, "transform", &Transform::scaled(1.1).to_css());
                }
                self.stages.schedule_after(now, REMOVE_DELAY_MS, Stage::Remove);
            }
            Stage::Remove => {
                if let Some(screen) = self.screen.take() {
                    surface.remove_node(screen);
                }
                self.bar = None;
                for (i, element) in self.hero.iter().enumerate() {
                    self.stages.schedule_after(
                        now,
                        i as f64 * ENTRANCE_STAGGER_MS,
                        Stage::Entrance(*element),
                    );
                }
                info!("Loading screen removed, playing entrance for {} elements", self.hero.len());
            }
            Stage::Entrance(element) => surface.add_class(element, "entrance-animate"),
        }
    }
}

impl Feature for LoadingScreen {
    fn name(&self) -> &'static str {
        "loading"
    }

    fn update(&mut self, now: f64, surface: &mut dyn Surface) {
        // stages may schedule zero-delay followups
        loop {
            let due = self.stages.drain_due(now);
            if due.is_empty() {
                break;
            }
            for stage in due {
                self.run(stage, now, surface);
            }
        }
    }

    fn handle_event(&mut self, _event: &PageEvent, _now: f64, _surface: &mut dyn Surface) -> bool {
        false
    }

    fn is_animating(&self) -> bool {
        !self.stages.is_empty()
    }

    fn teardown(&mut self, surface: &mut dyn Surface) {
        self.stages.clear();
        if let Some(screen) = self.screen.take() {
            surface.remove_node(screen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::math::{Rect, Vec2};
    use crate::storage::MemoryPreferences;
    use crate::surface::headless::HeadlessSurface;

    #[test]
    fn only_the_first_visit_shows_the_screen() {
        let mut session = MemoryPreferences::new();
        assert!(first_visit(&mut session));
        assert!(!first_visit(&mut session));
        assert!(first_visit(&mut MemoryPreferences::unavailable()));
    }

    #[test]
    fn screen_fills_fades_and_hands_over_to_the_hero() {
        let mut surface = HeadlessSurface::new(Vec2::new(1200.0, 800.0), 3000.0);
        let title = surface.insert("hero-title", None, Rect::new(0.0, 100.0, 600.0, 80.0), None);
        let cta = surface.insert("hero-cta", None, Rect::new(0.0, 200.0, 200.0, 40.0), None);
        let mut loading = LoadingScreen::with_seed("Folio", vec![title, cta], 3);

        loading.show(0.0, &mut surface);
        let screen = *surface.children(HeadlessSurface::ROOT).last().unwrap();
        assert!(surface.has_class(screen, "loading-screen"));

        let mut now = 0.0;
        let mut last = 0.0_f32;
        loading.update(now, &mut surface);
        while loading.progress() < 100.0 {
            assert!(loading.progress() >= last);
            last = loading.progress();
            now += PROGRESS_STEP_MS;
            loading.update(now, &mut surface);
            assert!(now < 1_000_000.0);
        }
        let bar = surface
            .children(surface.children(surface.children(screen)[0])[1])[0];
        assert_eq!(surface.style(bar, "width"), Some("100%"));

        loading.update(now + FADE_DELAY_MS, &mut surface);
        assert_eq!(surface.style(screen, "opacity"), Some("0"));
        assert_eq!(surface.style(screen, "transform"), Some("scale(1.1)"));

        let removed_at = now + FADE_DELAY_MS + REMOVE_DELAY_MS;
        loading.update(removed_at, &mut surface);
        assert!(!surface.exists(screen));
        assert!(!loading.is_showing());
        assert!(surface.has_class(title, "entrance-animate"));
        assert!(!surface.has_class(cta, "entrance-animate"));

        loading.update(removed_at + ENTRANCE_STAGGER_MS, &mut surface);
        assert!(surface.has_class(cta, "entrance-animate"));
        assert!(!loading.is_animating());
    }
}
