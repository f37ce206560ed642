use crate::app::PageEvent;
use crate::features::Feature;
use crate::gfx::math::{Color, Vec2};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::surface::{ElementId, Surface};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const RESIZE_DEBOUNCE_MS: f64 = 250.0;
const NARROW_VIEWPORT: f32 = 768.0;

pub fn particle_count(width: f32) -> usize {
    if width < 768.0 {
        30
    } else if width < 1024.0 {
        50
    } else {
        80
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub opacity: f32,
    pub life: f32,
    pub decay: f32,
    node: Option<ElementId>,
}

impl Particle {
    fn spawn(rng: &mut StdRng, bounds: Vec2) -> Self {
        let mut p = Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            size: rng.gen_range(1.0..=4.0),
            opacity: 0.0,
            life: 1.0,
            decay: rng.gen_range(0.001..=0.006),
            node: None,
        };
        p.reset(rng, bounds);
        p
    }

    /// Fresh position, velocity, opacity and full life. Size and decay
    /// stay with the particle.
    fn reset(&mut self, rng: &mut StdRng, bounds: Vec2) {
        self.position = Vec2::new(
            rng.gen_range(0.0..=bounds.x.max(0.0)),
            rng.gen_range(0.0..=bounds.y.max(0.0)),
        );
        self.velocity = Vec2::new(rng.gen_range(-0.25..=0.25), rng.gen_range(-0.25..=0.25));
        self.opacity = rng.gen_range(0.1..=0.6);
        self.life = 1.0;
    }

    fn out_of_bounds(&self, bounds: Vec2) -> bool {
        self.position.x < 0.0
            || self.position.x > bounds.x
            || self.position.y < 0.0
            || self.position.y > bounds.y
    }

    fn write(&self, surface: &mut dyn Surface) {
        if let Some(node) = self.node {
            surface.set_style(
                node,
                "transform",
                &format!("translate({}px, {}px)", self.position.x, self.position.y),
            );
            surface.set_style(node, "opacity", &(self.life * self.opacity).to_string());
        }
    }
}

pub struct ParticleField {
    container: ElementId,
    particles: Vec<Particle>,
    bounds: Vec2,
    rng: StdRng,
    resizes: Scheduler<Vec2>,
    pending_resize: Option<TaskHandle>,
    running: bool,
}

impl ParticleField {
    pub fn new(container: ElementId, bounds: Vec2) -> Self {
        Self::with_rng(container, bounds, StdRng::from_entropy())
    }

    pub fn with_seed(container: ElementId, bounds: Vec2, seed: u64) -> Self {
        Self::with_rng(container, bounds, StdRng::seed_from_u64(seed))
    }

    fn with_rng(container: ElementId, bounds: Vec2, rng: StdRng) -> Self {
        Self {
            container,
            particles: Vec::new(),
            bounds,
            rng,
            resizes: Scheduler::new(),
            pending_resize: None,
            running: false,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self, surface: &mut dyn Surface) {
        self.rebuild(surface);
        self.running = true;
        info!(
            "Particle field started with {} particles ({}x{})",
            self.particles.len(),
            self.bounds.x,
            self.bounds.y
        );
    }

    pub fn step(&mut self) {
        let bounds = self.bounds;
        for p in &mut self.particles {
            p.position += p.velocity;
            p.life -= p.decay;
            if p.life <= 0.0 || p.out_of_bounds(bounds) {
                p.reset(&mut self.rng, bounds);
            }
        }
    }

    pub fn tick(&mut self, surface: &mut dyn Surface) {
        self.step();
        for p in &self.particles {
            p.write(surface);
        }
    }

    /// Debounced: only the last resize within 250 ms takes effect.
    pub fn resize(&mut self, now: f64, bounds: Vec2) {
        if let Some(handle) = self.pending_resize.take() {
            self.resizes.cancel(handle);
        }
        self.pending_resize = Some(self.resizes.schedule_after(now, RESIZE_DEBOUNCE_MS, bounds));
    }

    fn apply_resize(&mut self, bounds: Vec2, surface: &mut dyn Surface) {
        let previous = self.particles.len();
        self.bounds = bounds;
        if particle_count(bounds.x) != previous {
            self.rebuild(surface);
            info!("Particle field rebuilt: {} -> {} particles", previous, self.particles.len());
        } else {
            self.apply_container_opacity(surface);
        }
    }

    fn rebuild(&mut self, surface: &mut dyn Surface) {
        surface.clear_children(self.container);
        let count = particle_count(self.bounds.x);
        self.particles = (0..count)
            .map(|_| {
                let mut p = Particle::spawn(&mut self.rng, self.bounds);
                let node = surface.create_node(self.container, "div");
                let glow = Color::rgba(255, 255, 255, 255).with_alpha(p.opacity * 0.5);
                surface.set_style(node, "position", "absolute");
                surface.set_style(node, "width", &format!("{}px", p.size));
                surface.set_style(node, "height", &format!("{}px", p.size));
                surface.set_style(node, "border-radius", "50%");
                surface.set_style(node, "pointer-events", "none");
                surface.set_style(
                    node,
                    "background",
                    &Color::rgba(255, 255, 255, 255).with_alpha(p.opacity).to_css(),
                );
                surface.set_style(
                    node,
                    "box-shadow",
                    &format!("0 0 {}px {}", p.size * 2.0, glow.to_css()),
                );
                p.node = Some(node);
                p.write(surface);
                p
            })
            .collect();
        self.apply_container_opacity(surface);
    }

    fn apply_container_opacity(&self, surface: &mut dyn Surface) {
        let opacity = if self.bounds.x <= NARROW_VIEWPORT { "0.5" } else { "1" };
        surface.set_style(self.container, "opacity", opacity);
    }

    /// Stops the loop, cancels a pending resize and removes every node.
    pub fn stop(&mut self, surface: &mut dyn Surface) {
        self.running = false;
        if let Some(handle) = self.pending_resize.take() {
            self.resizes.cancel(handle);
        }
        self.resizes.clear();
        surface.clear_children(self.container);
        self.particles.clear();
        info!("Particle field stopped");
    }
}

impl Feature for ParticleField {
    fn name(&self) -> &'static str {
        "particles"
    }

    fn update(&mut self, now: f64, surface: &mut dyn Surface) {
        if !self.running {
            return;
        }
        if let Some(bounds) = self.resizes.drain_due(now).pop() {
            self.pending_resize = None;
            debug!("applying resize to {}x{}", bounds.x, bounds.y);
            self.apply_resize(bounds, surface);
        }
        self.tick(surface);
    }

    fn handle_event(&mut self, event: &PageEvent, now: f64, _surface: &mut dyn Surface) -> bool {
        match event {
            PageEvent::Resize { width, height } => {
                self.resize(now, Vec2::new(*width, *height));
                false
            }
            _ => false,
        }
    }

    fn is_animating(&self) -> bool {
        self.running
    }

    fn teardown(&mut self, surface: &mut dyn Surface) {
        self.stop(surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::math::Rect;
    use crate::surface::headless::HeadlessSurface;
    use rstest::rstest;

    fn setup(width: f32, height: f32) -> (HeadlessSurface, ParticleField) {
        let mut surface = HeadlessSurface::new(Vec2::new(width, height), height);
        let container = surface.insert("particles", None, Rect::new(0.0, 0.0, width, height), None);
        let field = ParticleField::with_seed(container, Vec2::new(width, height), 7);
        (surface, field)
    }

    #[rstest]
    #[case(500.0, 30)]
    #[case(767.9, 30)]
    #[case(768.0, 50)]
    #[case(900.0, 50)]
    #[case(1024.0, 80)]
    #[case(1400.0, 80)]
    fn density_policy(#[case] width: f32, #[case] expected: usize) {
        assert_eq!(particle_count(width), expected);
    }

    #[test]
    fn spawned_attributes_stay_in_range() {
        let (mut surface, mut field) = setup(1400.0, 900.0);
        field.start(&mut surface);
        assert_eq!(field.particles().len(), 80);
        for p in field.particles() {
            assert!((1.0..=4.0).contains(&p.size));
            assert!((0.1..=0.6).contains(&p.opacity));
            assert!((0.001..=0.006).contains(&p.decay));
            assert!((-0.25..=0.25).contains(&p.velocity.x));
            assert!((-0.25..=0.25).contains(&p.velocity.y));
            assert_eq!(p.life, 1.0);
        }
    }

    #[test]
    fn life_and_position_hold_over_many_ticks() {
        let (mut surface, mut field) = setup(500.0, 400.0);
        field.start(&mut surface);
        let bounds = field.bounds();
        for _ in 0..3000 {
            let before: Vec<f32> = field.particles().iter().map(|p| p.life).collect();
            field.step();
            for (p, old) in field.particles().iter().zip(before) {
                assert!((0.0..=1.0).contains(&p.life));
                if p.life == 1.0 && old != 1.0 {
                    // just reset
                    assert!((0.0..=bounds.x).contains(&p.position.x));
                    assert!((0.0..=bounds.y).contains(&p.position.y));
                } else if p.life < 1.0 {
                    assert!(p.life < old);
                }
            }
        }
        assert_eq!(field.particles().len(), 30);
    }

    #[test]
    fn resize_is_debounced_and_rebuilds_on_density_change() {
        let (mut surface, mut field) = setup(1400.0, 900.0);
        field.start(&mut surface);
        assert_eq!(surface.children(field.container).len(), 80);

        field.resize(0.0, Vec2::new(1200.0, 900.0));
        field.resize(100.0, Vec2::new(600.0, 900.0));
        field.update(300.0, &mut surface);
        assert_eq!(field.particles().len(), 80);

        field.update(350.0, &mut surface);
        assert_eq!(field.particles().len(), 30);
        assert_eq!(surface.children(field.container).len(), 30);
        assert_eq!(surface.style(field.container, "opacity"), Some("0.5"));
    }

    #[test]
    fn resize_within_density_class_keeps_particles() {
        let (mut surface, mut field) = setup(1200.0, 900.0);
        field.start(&mut surface);
        let nodes: Vec<_> = field.particles().iter().map(|p| p.node).collect();

        field.resize(0.0, Vec2::new(1400.0, 900.0));
        field.update(RESIZE_DEBOUNCE_MS, &mut surface);
        assert_eq!(field.bounds(), Vec2::new(1400.0, 900.0));
        let kept: Vec<_> = field.particles().iter().map(|p| p.node).collect();
        assert_eq!(kept, nodes);
        assert_eq!(surface.children(field.container).len(), 80);
    }

    #[test]
    fn tick_writes_transform_and_opacity() {
        let (mut surface, mut field) = setup(900.0, 600.0);
        field.start(&mut surface);
        field.tick(&mut surface);
        let p = &field.particles()[0];
        let node = p.node.unwrap();
        assert_eq!(
            surface.style(node, "transform"),
            Some(format!("translate({}px, {}px)", p.position.x, p.position.y).as_str())
        );
        assert_eq!(
            surface.style(node, "opacity"),
            Some((p.life * p.opacity).to_string().as_str())
        );
    }

    #[test]
    fn stop_cancels_pending_resize_and_clears_nodes() {
        let (mut surface, mut field) = setup(1400.0, 900.0);
        field.start(&mut surface);
        field.resize(0.0, Vec2::new(500.0, 900.0));
        field.stop(&mut surface);
        assert!(!field.is_running());
        assert!(surface.children(field.container).is_empty());

        field.update(1000.0, &mut surface);
        assert!(field.particles().is_empty());
    }
}
