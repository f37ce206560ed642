pub mod counters;
pub mod filter;
pub mod floating;
pub mod form;
pub mod hover;
pub mod lazy;
pub mod loading;
pub mod particles;
pub mod reveal;
pub mod scroll;
pub mod text;
pub mod theme;

use crate::app::PageEvent;
use crate::surface::Surface;

/// A page controller driven by refresh ticks and input events.
pub trait Feature {
    fn name(&self) -> &'static str;

    /// Runs once per refresh tick.
    fn update(&mut self, now: f64, surface: &mut dyn Surface);

    /// Returns true when the event was consumed.
    fn handle_event(&mut self, event: &PageEvent, now: f64, surface: &mut dyn Surface) -> bool;

    /// Whether another tick would change anything.
    fn is_animating(&self) -> bool {
        false
    }

    fn teardown(&mut self, _surface: &mut dyn Surface) {}
}
