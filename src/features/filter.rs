use crate::app::PageEvent;
use crate::features::Feature;
use crate::gfx::transform::Transform;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::surface::{ElementId, Surface};
use log::info;
use std::collections::BTreeMap;

pub const SHOW_DELAY_MS: f64 = 100.0;
pub const HIDE_DELAY_MS: f64 = 300.0;

const HIDDEN_SCALE: f32 = 0.8;

/// `all` matches every item; any other filter matches categories that
/// contain it.
pub fn matches(filter: &str, category: &str) -> bool {
    filter == "all" || category.contains(filter)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Show(ElementId),
    Hide(ElementId),
}

pub struct ProjectFilter {
    buttons: Vec<(ElementId, String)>,
    items: Vec<(ElementId, String)>,
    steps: Scheduler<Step>,
    pending: BTreeMap<ElementId, TaskHandle>,
}

impl Default for ProjectFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectFilter {
    pub fn new() -> Self {
        Self {
            buttons: Vec::new(),
            items: Vec::new(),
            steps: Scheduler::new(),
            pending: BTreeMap::new(),
        }
    }

    pub fn add_button(&mut self, element: ElementId, filter: &str) {
        self.buttons.push((element, filter.to_string()));
    }

    pub fn add_item(&mut self, element: ElementId, category: &str) {
        self.items.push((element, category.to_string()));
    }

    /// Marks the filter's buttons active and animates items in or out. A
    /// later selection replaces any step still pending for an item.
    pub fn select(&mut self, filter: &str, now: f64, surface: &mut dyn Surface) {
        for (button, value) in &self.buttons {
            if value == filter {
                surface.add_class(*button, "active");
            } else {
                surface.remove_class(*button, "active");
            }
        }

        let mut shown = 0;
        for (item, category) in &self.items {
            if let Some(handle) = self.pending.remove(item) {
                self.steps.cancel(handle);
            }
            let step = if matches(filter, category) {
                shown += 1;
                surface.set_style(*item, "display", "block");
                self.steps.schedule_after(now, SHOW_DELAY_MS, Step::Show(*item))
            } else {
                surface.set_style(*item, "opacity", "0");
                surface.set_style(*item, "transform", &Transform::scaled(HIDDEN_SCALE).to_css());
                self.steps.schedule_after(now, HIDE_DELAY_MS, Step::Hide(*item))
            };
            self.pending.insert(*item, step);
        }
        info!("Project filter {:?}: {} of {} shown", filter, shown, self.items.len());
    }
}

impl Feature for ProjectFilter {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn update(&mut self, now: f64, surface: &mut dyn Surface) {
        for step in self.steps.drain_due(now) {
            match step {
                Step::Show(item) => {
                    self.pending.remove(&item);
                    surface.set_style(item, "opacity", "1");
                    surface.set_style(item, "transform", &Transform::default().to_css());
                }
                Step::Hide(item) => {
                    self.pending.remove(&item);
                    surface.set_style(item, "display", "none");
                }
            }
        }
    }

    fn handle_event(&mut self, event: &PageEvent, now: f64, surface: &mut dyn Surface) -> bool {
        let PageEvent::PointerDown { element, .. } = event else {
            return false;
        };
        let Some(filter) = self
            .buttons
            .iter()
            .find(|(button, _)| button == element)
            .map(|(_, filter)| filter.clone())
        else {
            return false;
        };
        self.select(&filter, now, surface);
        true
    }

    fn is_animating(&self) -> bool {
        !self.steps.is_empty()
    }

    fn teardown(&mut self, _surface: &mut dyn Surface) {
        self.steps.clear();
        self.pending.clear();
    }
}
