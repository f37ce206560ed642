pub mod headless;

use crate::gfx::math::{Rect, Vec2};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Geometry queries and mutations on the rendered page.
///
/// Rects returned by [`Surface::bounding_rect`] are relative to the
/// viewport, like a client rect: they already account for scrolling.
pub trait Surface {
    fn root(&self) -> ElementId;
    fn viewport(&self) -> Vec2;
    fn scroll_offset(&self) -> f32;
    fn document_height(&self) -> f32;
    fn bounding_rect(&self, element: ElementId) -> Option<Rect>;

    /// Whether visibility observation is available at all.
    fn supports_intersection(&self) -> bool {
        true
    }

    /// Hover-capable precise pointer, as opposed to touch.
    fn has_fine_pointer(&self) -> bool {
        true
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str);
    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str);
    fn remove_attribute(&mut self, element: ElementId, name: &str);
    fn add_class(&mut self, element: ElementId, class: &str);
    fn remove_class(&mut self, element: ElementId, class: &str);
    fn set_text(&mut self, element: ElementId, text: &str);
    fn text(&self, element: ElementId) -> Option<String>;
    fn children(&self, element: ElementId) -> Vec<ElementId>;

    fn create_node(&mut self, parent: ElementId, tag: &str) -> ElementId;
    fn remove_node(&mut self, element: ElementId);

    fn clear_children(&mut self, element: ElementId) {
        for child in self.children(element) {
            self.remove_node(child);
        }
    }
}
