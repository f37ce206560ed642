use crate::app::PageEvent;
use crate::features::Feature;
use crate::gfx::math::Vec2;
use crate::gfx::transform::Transform;
use crate::surface::{ElementId, Surface};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SHAPES_PER_CONTAINER: usize = 5;
pub const REPEL_RADIUS: f32 = 200.0;
pub const REPEL_DISTANCE: f32 = 30.0;

const SHAPE_BACKGROUND: &str =
    "linear-gradient(45deg, rgba(255,255,255,0.1), rgba(255,255,255,0.05))";

/// Push applied to a shape centred at `center` by a pointer at `pointer`.
/// Falls off linearly to nothing at [`REPEL_RADIUS`].
pub fn repulsion(pointer: Vec2, center: Vec2) -> Vec2 {
    let away = center - pointer;
    let distance = away.length();
    if distance >= REPEL_RADIUS {
        return Vec2::ZERO;
    }
    let force = (REPEL_RADIUS - distance) / REPEL_RADIUS;
    let angle = away.y.atan2(away.x);
    Vec2::new(angle.cos(), angle.sin()) * (force * REPEL_DISTANCE)
}

#[derive(Debug, Clone, Copy)]
struct Shape {
    node: ElementId,
    container: ElementId,
    // fraction of the container box
    anchor: Vec2,
    size: f32,
}

impl Shape {
    fn center(&self, surface: &dyn Surface) -> Option<Vec2> {
        let rect = surface.bounding_rect(self.container)?;
        let half = self.size / 2.0;
        Some(Vec2::new(
            rect.x + rect.width * self.anchor.x + half,
            rect.y + rect.height * self.anchor.y + half,
        ))
    }
}

pub struct FloatingElements {
    shapes: Vec<Shape>,
    rng: StdRng,
}

impl Default for FloatingElements {
    fn default() -> Self {
        Self::new()
    }
}

impl FloatingElements {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            shapes: Vec::new(),
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn add_container(&mut self, container: ElementId, surface: &mut dyn Surface) {
        surface.set_style(container, "position", "relative");
        for _ in 0..SHAPES_PER_CONTAINER {
            let size = self.rng.gen_range(50.0..150.0_f32);
            let anchor = Vec2::new(self.rng.gen_range(0.0..1.0), self.rng.gen_range(0.0..1.0));
            let duration = self.rng.gen_range(10.0..20.0_f32);
            let delay = self.rng.gen_range(0.0..5.0_f32);

            let node = surface.create_node(container, "div");
            surface.add_class(node, "floating-shape");
            for (property, value) in [
                ("position", "absolute".to_string()),
                ("width", format!("{}px", size)),
                ("height", format!("{}px", size)),
                ("background", SHAPE_BACKGROUND.to_string()),
                ("border-radius", "50%".to_string()),
                ("top", format!("{}%", anchor.y * 100.0)),
                ("left", format!("{}%", anchor.x * 100.0)),
                ("pointer-events", "none".to_string()),
                ("z-index", "1".to_string()),
                (
                    "animation",
                    format!("float {:.2}s ease-in-out infinite {:.2}s", duration, delay),
                ),
                ("filter", "blur(1px)".to_string()),
            ] {
                surface.set_style(node, property, &value);
            }
            self.shapes.push(Shape {
                node,
                container,
                anchor,
                size,
            });
        }
        debug!("floating shapes added to {}", container);
    }

    fn pointer_moved(&self, pointer: Vec2, surface: &mut dyn Surface) {
        for shape in &self.shapes {
            let Some(center) = shape.center(surface) else {
                continue;
            };
            let push = repulsion(pointer, center);
            surface.set_style(shape.node, "transform", &Transform::translate(push.x, push.y).to_css());
        }
    }
}

impl Feature for FloatingElements {
    fn name(&self) -> &'static str {
        "floating"
    }

    fn update(&mut self, _now: f64, _surface: &mut dyn Surface) {}

    fn handle_event(&mut self, event: &PageEvent, _now: f64, surface: &mut dyn Surface) -> bool {
        if let PageEvent::PointerMove { pos } = event {
            self.pointer_moved(*pos, surface);
        }
        false
    }

    fn teardown(&mut self, surface: &mut dyn Surface) {
        for shape in self.shapes.drain(..) {
            surface.remove_node(shape.node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::math::Rect;
    use crate::surface::headless::HeadlessSurface;
    use rstest::rstest;

    #[rstest]
    #[case(Vec2::new(100.0, 0.0), Vec2::new(15.0, 0.0))]
    #[case(Vec2::new(0.0, -50.0), Vec2::new(0.0, -22.5))]
    #[case(Vec2::new(200.0, 0.0), Vec2::ZERO)]
    #[case(Vec2::new(300.0, 300.0), Vec2::ZERO)]
    fn push_falls_off_with_distance(#[case] center: Vec2, #[case] expected: Vec2) {
        let push = repulsion(Vec2::ZERO, center);
        assert!((push.x - expected.x).abs() < 1e-4, "{:?}", push);
        assert!((push.y - expected.y).abs() < 1e-4, "{:?}", push);
    }

    #[test]
    fn shapes_move_away_from_a_nearby_pointer() {
        let mut surface = HeadlessSurface::new(Vec2::new(1200.0, 800.0), 3000.0);
        let hero = surface.insert("hero", None, Rect::new(0.0, 0.0, 1200.0, 800.0), None);
        let mut floating = FloatingElements::with_seed(11);
        floating.add_container(hero, &mut surface);
        assert_eq!(floating.len(), SHAPES_PER_CONTAINER);
        assert_eq!(surface.children(hero).len(), SHAPES_PER_CONTAINER);

        let shape = floating.shapes[0];
        let center = shape.center(&surface).unwrap();
        let pointer = center - Vec2::new(50.0, 0.0);
        assert!(!floating.handle_event(&PageEvent::PointerMove { pos: pointer }, 0.0, &mut surface));
        assert_eq!(surface.style(shape.node, "transform"), Some("translate(22.5px, 0px)"));

        let far = center + Vec2::new(0.0, 500.0);
        floating.handle_event(&PageEvent::PointerMove { pos: far }, 0.0, &mut surface);
        assert_eq!(surface.style(shape.node, "transform"), Some("none"));

        floating.teardown(&mut surface);
        assert!(surface.children(hero).is_empty());
    }
}
