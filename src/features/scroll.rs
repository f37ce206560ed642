use crate::app::PageEvent;
use crate::features::Feature;
use crate::gfx::transform::Transform;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::surface::{ElementId, Surface};
use log::debug;

pub const PARALLAX_SETTLE_MS: f64 = 16.0;
pub const HEADER_SCROLL_THRESHOLD: f32 = 50.0;
pub const NAV_OFFSET: f32 = 100.0;

const HEADER_SCROLLED: &str = "rgba(248, 249, 250, 0.95)";
const HEADER_AT_TOP: &str = "rgba(248, 249, 250, 0.8)";

/// Vertical shift of a layer whose document top is `initial_top`.
pub fn parallax_offset(scroll: f32, initial_top: f32, speed: f32) -> f32 {
    -(scroll - initial_top) * speed
}

/// Scroll progress in percent; zero when the page does not scroll.
pub fn scroll_progress(scroll: f32, document_height: f32, viewport_height: f32) -> f32 {
    let range = document_height - viewport_height;
    if range <= 0.0 {
        return 0.0;
    }
    (scroll / range * 100.0).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy)]
struct Layer {
    element: ElementId,
    speed: f32,
    initial_top: f32,
    height: f32,
}

#[derive(Debug, Clone, Copy)]
struct NavSection {
    link: ElementId,
    top: f32,
    height: f32,
}

pub struct ScrollEffects {
    layers: Vec<Layer>,
    sections: Vec<NavSection>,
    progress_bar: Option<ElementId>,
    header: Option<ElementId>,
    settle: Scheduler<()>,
    pending: Option<TaskHandle>,
}

impl Default for ScrollEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollEffects {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            sections: Vec::new(),
            progress_bar: None,
            header: None,
            settle: Scheduler::new(),
            pending: None,
        }
    }

    /// Records the layer's document position as laid out right now.
    pub fn add_parallax(&mut self, element: ElementId, speed: f32, surface: &dyn Surface) {
        let Some(rect) = surface.bounding_rect(element) else {
            return;
        };
        self.layers.push(Layer {
            element,
            speed,
            initial_top: rect.y + surface.scroll_offset(),
            height: rect.height,
        });
    }

    /// Ties a nav link to the section it jumps to.
    pub fn add_nav_section(&mut self, section: ElementId, link: ElementId, surface: &dyn Surface) {
        let Some(rect) = surface.bounding_rect(section) else {
            return;
        };
        self.sections.push(NavSection {
            link,
            top: rect.y + surface.scroll_offset(),
            height: rect.height,
        });
    }

    /// Marks the link of the section under the header line active. Leaves
    /// the links alone when no section is there.
    pub fn highlight_nav(&self, surface: &mut dyn Surface) {
        let line = surface.scroll_offset() + NAV_OFFSET;
        let Some(current) = self
            .sections
            .iter()
            .rev()
            .find(|s| line >= s.top && line < s.top + s.height)
        else {
            return;
        };
        for section in &self.sections {
            surface.remove_class(section.link, "active");
        }
        surface.add_class(current.link, "active");
    }

    pub fn set_progress_bar(&mut self, element: ElementId) {
        self.progress_bar = Some(element);
    }

    pub fn set_header(&mut self, element: ElementId) {
        self.header = Some(element);
    }

    /// Applies the scroll-linked styles and restarts the parallax settle
    /// timer.
    pub fn scrolled(&mut self, now: f64, surface: &mut dyn Surface) {
        let scroll = surface.scroll_offset();
        if let Some(bar) = self.progress_bar {
            let progress =
                scroll_progress(scroll, surface.document_height(), surface.viewport().y);
            surface.set_style(bar, "width", &format!("{}%", progress));
        }
        if let Some(header) = self.header {
            let background = if scroll > HEADER_SCROLL_THRESHOLD {
                HEADER_SCROLLED
            } else {
                HEADER_AT_TOP
            };
            surface.set_style(header, "background", background);
        }
        self.highlight_nav(surface);
        if !self.layers.is_empty() {
            if let Some(handle) = self.pending.take() {
                self.settle.cancel(handle);
            }
            self.pending = Some(self.settle.schedule_after(now, PARALLAX_SETTLE_MS, ()));
        }
    }

    fn apply_parallax(&self, surface: &mut dyn Surface) {
        let scroll = surface.scroll_offset();
        let viewport_height = surface.viewport().y;
        for layer in &self.layers {
            let top = layer.initial_top - scroll;
            if top < viewport_height && top > -layer.height {
                let shift = parallax_offset(scroll, layer.initial_top, layer.speed);
                surface.set_style(
                    layer.element,
                    "transform",
                    &Transform::translate(0.0, shift).to_css(),
                );
            }
        }
    }
}

impl Feature for ScrollEffects {
    fn name(&self) -> &'static str {
        "scroll"
    }

    fn update(&mut self, now: f64, surface: &mut dyn Surface) {
        if !self.settle.drain_due(now).is_empty() {
            self.pending = None;
            debug!("parallax settled at {}", surface.scroll_offset());
            self.apply_parallax(surface);
        }
    }

    fn handle_event(&mut self, event: &PageEvent, now: f64, surface: &mut dyn Surface) -> bool {
        match event {
            PageEvent::Scroll { .. } | PageEvent::Resize { .. } => {
                self.scrolled(now, surface);
                false
            }
            _ => false,
        }
    }

    fn is_animating(&self) -> bool {
        !self.settle.is_empty()
    }

    fn teardown(&mut self, _surface: &mut dyn Surface) {
        self.settle.clear();
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::math::{Rect, Vec2};
    use crate::surface::headless::HeadlessSurface;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 3000.0, 1000.0, 0.0)]
    #[case(1000.0, 3000.0, 1000.0, 50.0)]
    #[case(2000.0, 3000.0, 1000.0, 100.0)]
    #[case(0.0, 800.0, 1000.0, 0.0)]
    fn progress_percent(
        #[case] scroll: f32,
        #[case] document: f32,
        #[case] viewport: f32,
        #[case] expected: f32,
    ) {
        assert_eq!(scroll_progress(scroll, document, viewport), expected);
    }

    #[test]
    fn header_switches_past_fifty_pixels() {
        let mut surface = HeadlessSurface::new(Vec2::new(1200.0, 800.0), 3000.0);
        let header = surface.insert("header", None, Rect::new(0.0, 0.0, 1200.0, 80.0), None);
        let mut effects = ScrollEffects::new();
        effects.set_header(header);

        surface.set_scroll(50.0);
        effects.scrolled(0.0, &mut surface);
        assert_eq!(surface.style(header, "background"), Some(HEADER_AT_TOP));
        surface.set_scroll(51.0);
        effects.scrolled(0.0, &mut surface);
        assert_eq!(surface.style(header, "background"), Some(HEADER_SCROLLED));
    }

    #[test]
    fn nav_link_follows_the_section_under_the_header() {
        let mut surface = HeadlessSurface::new(Vec2::new(1200.0, 800.0), 3000.0);
        let about = surface.insert("about", None, Rect::new(0.0, 0.0, 1200.0, 900.0), None);
        let work = surface.insert("work", None, Rect::new(0.0, 900.0, 1200.0, 1000.0), None);
        let about_link = surface.insert("nav-about", None, Rect::default(), None);
        let work_link = surface.insert("nav-work", None, Rect::default(), None);
        let mut effects = ScrollEffects::new();
        effects.add_nav_section(about, about_link, &surface);
        effects.add_nav_section(work, work_link, &surface);

        effects.highlight_nav(&mut surface);
        assert!(surface.has_class(about_link, "active"));

        surface.set_scroll(799.0);
        effects.scrolled(0.0, &mut surface);
        assert!(surface.has_class(about_link, "active"));
        surface.set_scroll(800.0);
        effects.scrolled(0.0, &mut surface);
        assert!(surface.has_class(work_link, "active"));
        assert!(!surface.has_class(about_link, "active"));

        // past every section the last highlight stays
        surface.set_scroll(2200.0);
        effects.scrolled(0.0, &mut surface);
        assert!(surface.has_class(work_link, "active"));
    }

    #[test]
    fn parallax_waits_for_scrolling_to_settle() {
        let mut surface = HeadlessSurface::new(Vec2::new(1200.0, 800.0), 3000.0);
        let layer = surface.insert("shapes", None, Rect::new(0.0, 400.0, 600.0, 300.0), None);
        let far = surface.insert("footer-art", None, Rect::new(0.0, 2600.0, 600.0, 300.0), None);
        let mut effects = ScrollEffects::new();
        effects.add_parallax(layer, 0.5, &surface);
        effects.add_parallax(far, 0.5, &surface);

        surface.set_scroll(100.0);
        effects.handle_event(&PageEvent::Scroll { offset: 100.0 }, 0.0, &mut surface);
        surface.set_scroll(200.0);
        effects.handle_event(&PageEvent::Scroll { offset: 200.0 }, 10.0, &mut surface);
        effects.update(20.0, &mut surface);
        assert_eq!(surface.style(layer, "transform"), None);

        effects.update(26.0, &mut surface);
        assert_eq!(surface.style(layer, "transform"), Some("translate(0px, 100px)"));
        assert_eq!(surface.style(far, "transform"), None);
        assert!(!effects.is_animating());
    }
}
