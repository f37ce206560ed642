use crate::app::PageEvent;
use crate::config::HoverKind;
use crate::features::Feature;
use crate::gfx::anim::{ease_out_cubic, Tween};
use crate::gfx::math::{Color, Vec2};
use crate::gfx::transform::Transform;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::surface::{ElementId, Surface};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

pub const RIPPLE_DURATION_MS: f64 = 600.0;
pub const BUTTON_MAGNETIC_STRENGTH: f32 = 0.2;
pub const CARD_STAGGER_MS: f64 = 50.0;

const LIFT_PX: f32 = -10.0;
const HOVER_SCALE: f32 = 1.05;
const HOVER_ROTATE_DEG: f32 = 5.0;
const GLOW_ON: &str = "0 0 30px rgba(0, 0, 0, 0.3)";
const GLOW_OFF: &str = "0 4px 6px -1px rgba(0, 0, 0, 0.1)";

/// Offset that pulls an element toward the pointer.
pub fn magnetic_offset(pointer: Vec2, center: Vec2, strength: f32) -> Vec2 {
    (pointer - center) * strength
}

#[derive(Debug, Clone, Copy, Default)]
struct HoverState {
    hovered: bool,
    offset: Vec2,
    lift: f32,
    scale: Option<f32>,
    rotate: f32,
}

impl HoverState {
    fn transform(&self) -> Transform {
        Transform {
            translate: self.offset + Vec2::new(0.0, self.lift),
            scale: self.scale.unwrap_or(1.0),
            rotate_deg: self.rotate,
        }
    }
}

#[derive(Debug, Default)]
struct Binding {
    kinds: Vec<HoverKind>,
    magnetic: Option<f32>,
    ripple: bool,
    card: bool,
    card_tasks: Vec<TaskHandle>,
    state: HoverState,
}

#[derive(Debug)]
struct Ripple {
    node: ElementId,
    tween: Tween,
}

pub struct HoverEffects {
    bindings: BTreeMap<ElementId, Binding>,
    ripples: Vec<Ripple>,
    card_reveals: Scheduler<ElementId>,
}

impl Default for HoverEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl HoverEffects {
    pub fn new() -> Self {
        Self {
            bindings: BTreeMap::new(),
            ripples: Vec::new(),
            card_reveals: Scheduler::new(),
        }
    }

    pub fn add_hover(&mut self, element: ElementId, kind: HoverKind) {
        self.bindings.entry(element).or_default().kinds.push(kind);
    }

    pub fn add_magnetic(&mut self, element: ElementId, strength: f32) {
        self.bindings.entry(element).or_default().magnetic = Some(strength);
    }

    /// Ripple on press and a magnetic pull while hovered.
    pub fn add_button(&mut self, element: ElementId) {
        let binding = self.bindings.entry(element).or_default();
        binding.ripple = true;
        binding.magnetic.get_or_insert(BUTTON_MAGNETIC_STRENGTH);
    }

    pub fn add_card(&mut self, element: ElementId) {
        self.bindings.entry(element).or_default().card = true;
    }

    pub fn active_ripples(&self) -> usize {
        self.ripples.len()
    }

    fn enter(&mut self, element: ElementId, now: f64, surface: &mut dyn Surface) -> bool {
        let Some(binding) = self.bindings.get_mut(&element) else {
            return false;
        };
        binding.state.hovered = true;
        for kind in &binding.kinds {
            match kind {
                HoverKind::Lift => binding.state.lift = LIFT_PX,
                HoverKind::Scale => binding.state.scale = Some(HOVER_SCALE),
                HoverKind::Rotate => binding.state.rotate = HOVER_ROTATE_DEG,
                HoverKind::Glow => surface.set_style(element, "box-shadow", GLOW_ON),
            }
        }
        if binding.card {
            for (i, child) in surface.children(element).into_iter().enumerate() {
                let handle = self
                    .card_reveals
                    .schedule_after(now, i as f64 * CARD_STAGGER_MS, child);
                binding.card_tasks.push(handle);
            }
        }
        surface.set_style(element, "transform", &binding.state.transform().to_css());
        true
    }

    fn leave(&mut self, element: ElementId, surface: &mut dyn Surface) -> bool {
        let Some(binding) = self.bindings.get_mut(&element) else {
            return false;
        };
        let glow = binding.kinds.contains(&HoverKind::Glow);
        binding.state = HoverState::default();
        if glow {
            surface.set_style(element, "box-shadow", GLOW_OFF);
        }
        if binding.card {
            for handle in binding.card_tasks.drain(..) {
                self.card_reveals.cancel(handle);
            }
            let settled = Transform::translate(0.0, 5.0).to_css();
            for child in surface.children(element) {
                surface.set_style(child, "transform", &settled);
                surface.set_style(child, "opacity", "0.8");
            }
        }
        surface.set_style(element, "transform", &binding.state.transform().to_css());
        true
    }

    fn pointer_moved(&mut self, pos: Vec2, surface: &mut dyn Surface) -> bool {
        let mut handled = false;
        for (element, binding) in self.bindings.iter_mut() {
            let (Some(strength), true) = (binding.magnetic, binding.state.hovered) else {
                continue;
            };
            let Some(rect) = surface.bounding_rect(*element) else {
                continue;
            };
            binding.state.offset = magnetic_offset(pos, rect.center(), strength);
            surface.set_style(*element, "transform", &binding.state.transform().to_css());
            handled = true;
        }
        handled
    }

    fn spawn_ripple(&mut self, element: ElementId, pos: Vec2, now: f64, surface: &mut dyn Surface) -> bool {
        if !self.bindings.get(&element).is_some_and(|b| b.ripple) {
            return false;
        }
        let Some(rect) = surface.bounding_rect(element) else {
            return false;
        };
        let size = rect.width.max(rect.height);
        let left = pos.x - rect.x - size / 2.0;
        let top = pos.y - rect.y - size / 2.0;

        surface.set_style(element, "position", "relative");
        surface.set_style(element, "overflow", "hidden");
        let node = surface.create_node(element, "span");
        surface.set_style(node, "position", "absolute");
        surface.set_style(node, "width", &format!("{}px", size));
        surface.set_style(node, "height", &format!("{}px", size));
        surface.set_style(
            node,
            "background",
            &Color::rgba(255, 255, 255, 255).with_alpha(0.3).to_css(),
        );
        surface.set_style(node, "border-radius", "50%");
        surface.set_style(node, "transform", &Transform::scaled(0.0).to_css());
        surface.set_style(node, "left", &format!("{}px", left));
        surface.set_style(node, "top", &format!("{}px", top));
        surface.set_style(node, "pointer-events", "none");
        surface.set_style(node, "z-index", "1000");

        debug!("ripple {} spawned in {}", node, element);
        self.ripples.push(Ripple {
            node,
            tween: Tween::new(0.0, 1.0, RIPPLE_DURATION_MS, ease_out_cubic).starting_at(now),
        });
        true
    }
}

impl Feature for HoverEffects {
    fn name(&self) -> &'static str {
        "hover"
    }

    fn update(&mut self, now: f64, surface: &mut dyn Surface) {
        for child in self.card_reveals.drain_due(now) {
            surface.set_style(child, "transform", &Transform::IDENTITY.to_css());
            surface.set_style(child, "opacity", "1");
        }
        for binding in self.bindings.values_mut() {
            binding
                .card_tasks
                .retain(|handle| self.card_reveals.is_pending(*handle));
        }

        self.ripples.retain_mut(|ripple| {
            let sample = ripple.tween.sample(now);
            if sample.done {
                surface.remove_node(ripple.node);
                return false;
            }
            let p = sample.value as f32;
            surface.set_style(ripple.node, "transform", &Transform::scaled(2.0 * p).to_css());
            surface.set_style(ripple.node, "opacity", &(1.0 - p).to_string());
            true
        });
    }

    fn handle_event(&mut self, event: &PageEvent, now: f64, surface: &mut dyn Surface) -> bool {
        match event {
            PageEvent::PointerEnter { element, .. } => self.enter(*element, now, surface),
            PageEvent::PointerLeave { element } => self.leave(*element, surface),
            PageEvent::PointerMove { pos } => self.pointer_moved(*pos, surface),
            PageEvent::PointerDown { element, pos } => self.spawn_ripple(*element, *pos, now, surface),
            _ => false,
        }
    }

    fn is_animating(&self) -> bool {
        !self.ripples.is_empty() || !self.card_reveals.is_empty()
    }

    fn teardown(&mut self, surface: &mut dyn Surface) {
        for ripple in self.ripples.drain(..) {
            surface.remove_node(ripple.node);
        }
        self.card_reveals.clear();
    }
}

pub const CURSOR_EASE: f32 = 0.3;
pub const FOLLOWER_EASE: f32 = 0.1;
const CURSOR_HOVER_SCALE: f32 = 1.5;

/// A cursor dot and a lagging ring that chase the pointer.
pub struct CursorFollower {
    cursor: Option<ElementId>,
    follower: Option<ElementId>,
    targets: Vec<ElementId>,
    pointer: Vec2,
    cursor_pos: Vec2,
    follower_pos: Vec2,
    hovering: BTreeSet<ElementId>,
}

impl CursorFollower {
    pub fn new(cursor: Option<ElementId>, follower: Option<ElementId>, targets: Vec<ElementId>) -> Self {
        Self {
            cursor,
            follower,
            targets,
            pointer: Vec2::ZERO,
            cursor_pos: Vec2::ZERO,
            follower_pos: Vec2::ZERO,
            hovering: BTreeSet::new(),
        }
    }

    pub fn positions(&self) -> (Vec2, Vec2) {
        (self.cursor_pos, self.follower_pos)
    }

    fn scale(&self) -> f32 {
        if !self.hovering.is_empty() {
            CURSOR_HOVER_SCALE
        } else {
            1.0
        }
    }
}

impl Feature for CursorFollower {
    fn name(&self) -> &'static str {
        "cursor"
    }

    fn update(&mut self, _now: f64, surface: &mut dyn Surface) {
        self.cursor_pos += (self.pointer - self.cursor_pos) * CURSOR_EASE;
        self.follower_pos += (self.pointer - self.follower_pos) * FOLLOWER_EASE;
        let scale = self.scale();
        if let Some(cursor) = self.cursor {
            let t = Transform {
                translate: self.cursor_pos - Vec2::new(10.0, 10.0),
                scale,
                rotate_deg: 0.0,
            };
            surface.set_style(cursor, "transform", &t.to_css());
        }
        if let Some(follower) = self.follower {
            let t = Transform {
                translate: self.follower_pos - Vec2::new(20.0, 20.0),
                scale,
                rotate_deg: 0.0,
            };
            surface.set_style(follower, "transform", &t.to_css());
        }
    }

    fn handle_event(&mut self, event: &PageEvent, _now: f64, _surface: &mut dyn Surface) -> bool {
        match event {
            PageEvent::PointerMove { pos } => {
                self.pointer = *pos;
                false
            }
            PageEvent::PointerEnter { element, .. } if self.targets.contains(element) => {
                self.hovering.insert(*element);
                true
            }
            PageEvent::PointerLeave { element } if self.targets.contains(element) => {
                self.hovering.remove(element);
                true
            }
            _ => false,
        }
    }

    fn is_animating(&self) -> bool {
        (self.pointer - self.follower_pos).length() > 0.5
    }
}
