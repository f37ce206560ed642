use super::{ElementId, Surface};
use crate::gfx::math::{Rect, Vec2};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    name: Option<String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    layout: Rect,
    styles: BTreeMap<String, String>,
    attributes: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    text: String,
}

#[derive(Debug)]
pub struct HeadlessSurface {
    nodes: BTreeMap<ElementId, Node>,
    next_id: u32,
    viewport: Vec2,
    document_height: f32,
    scroll: f32,
    intersection: bool,
    fine_pointer: bool,
    mutations: u64,
}

impl HeadlessSurface {
    pub const ROOT: ElementId = ElementId(0);

    pub fn new(viewport: Vec2, document_height: f32) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            Self::ROOT,
            Node {
                tag: "html".to_string(),
                layout: Rect::new(0.0, 0.0, viewport.x, document_height.max(viewport.y)),
                ..Node::default()
            },
        );
        Self {
            nodes,
            next_id: 1,
            viewport,
            document_height: document_height.max(viewport.y),
            scroll: 0.0,
            intersection: true,
            fine_pointer: true,
            mutations: 0,
        }
    }

    /// Adds a named element laid out at `layout` in document coordinates.
    pub fn insert(
        &mut self,
        name: &str,
        parent: Option<ElementId>,
        layout: Rect,
        text: Option<&str>,
    ) -> ElementId {
        let parent = parent.unwrap_or(Self::ROOT);
        let id = self.alloc(parent, "div");
        if let Some(node) = self.nodes.get_mut(&id) {
            node.name = Some(name.to_string());
            node.layout = layout;
            node.text = text.unwrap_or_default().to_string();
        }
        id
    }

    pub fn find(&self, name: &str) -> Option<ElementId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name.as_deref() == Some(name))
            .map(|(id, _)| *id)
    }

    pub fn exists(&self, element: ElementId) -> bool {
        self.nodes.contains_key(&element)
    }

    pub fn tag(&self, element: ElementId) -> Option<&str> {
        self.nodes.get(&element).map(|n| n.tag.as_str())
    }

    pub fn style(&self, element: ElementId, property: &str) -> Option<&str> {
        self.nodes.get(&element)?.styles.get(property).map(String::as_str)
    }

    pub fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
        self.nodes.get(&element)?.attributes.get(name).map(String::as_str)
    }

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.nodes
            .get(&element)
            .is_some_and(|n| n.classes.contains(class))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    pub fn set_scroll(&mut self, offset: f32) {
        let max = (self.document_height - self.viewport.y).max(0.0);
        self.scroll = offset.clamp(0.0, max);
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
        self.document_height = self.document_height.max(viewport.y);
    }

    pub fn set_intersection_support(&mut self, supported: bool) {
        self.intersection = supported;
    }

    pub fn set_fine_pointer(&mut self, fine: bool) {
        self.fine_pointer = fine;
    }

    fn alloc(&mut self, parent: ElementId, tag: &str) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        let layout = self
            .nodes
            .get(&parent)
            .map(|p| Rect::new(p.layout.x, p.layout.y, 0.0, 0.0))
            .unwrap_or_default();
        self.nodes.insert(
            id,
            Node {
                tag: tag.to_string(),
                parent: Some(parent),
                layout,
                ..Node::default()
            },
        );
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        self.mutations += 1;
        id
    }

    fn node_mut(&mut self, element: ElementId) -> Option<&mut Node> {
        let node = self.nodes.get_mut(&element);
        if node.is_some() {
            self.mutations += 1;
        }
        node
    }
}

impl Surface for HeadlessSurface {
    fn root(&self) -> ElementId {
        Self::ROOT
    }

    fn viewport(&self) -> Vec2 {
        self.viewport
    }

    fn scroll_offset(&self) -> f32 {
        self.scroll
    }

    fn document_height(&self) -> f32 {
        self.document_height
    }

    fn bounding_rect(&self, element: ElementId) -> Option<Rect> {
        self.nodes
            .get(&element)
            .map(|n| n.layout.offset(0.0, -self.scroll))
    }

    fn supports_intersection(&self) -> bool {
        self.intersection
    }

    fn has_fine_pointer(&self) -> bool {
        self.fine_pointer
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) {
        if let Some(node) = self.node_mut(element) {
            node.styles.insert(property.to_string(), value.to_string());
        }
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(element) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, element: ElementId, name: &str) {
        if let Some(node) = self.node_mut(element) {
            node.attributes.remove(name);
        }
    }

    fn add_class(&mut self, element: ElementId, class: &str) {
        if let Some(node) = self.node_mut(element) {
            node.classes.insert(class.to_string());
        }
    }

    fn remove_class(&mut self, element: ElementId, class: &str) {
        if let Some(node) = self.node_mut(element) {
            node.classes.remove(class);
        }
    }

    fn set_text(&mut self, element: ElementId, text: &str) {
        if let Some(node) = self.node_mut(element) {
            node.text = text.to_string();
        }
    }

    fn text(&self, element: ElementId) -> Option<String> {
        self.nodes.get(&element).map(|n| n.text.clone())
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.nodes
            .get(&element)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn create_node(&mut self, parent: ElementId, tag: &str) -> ElementId {
        self.alloc(parent, tag)
    }

    fn remove_node(&mut self, element: ElementId) {
        if element == Self::ROOT {
            return;
        }
        let Some(node) = self.nodes.remove(&element) else {
            return;
        };
        self.mutations += 1;
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != element);
        }
        for child in node.children {
            self.remove_node(child);
        }
        debug!("removed {} <{}>", element, node.tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_a_node_removes_its_subtree() {
        let mut s = HeadlessSurface::new(Vec2::new(800.0, 600.0), 2000.0);
        let section = s.insert("section", None, Rect::new(0.0, 100.0, 800.0, 300.0), None);
        let child = s.create_node(section, "span");
        let grandchild = s.create_node(child, "span");
        assert_eq!(s.children(section), vec![child]);

        s.remove_node(child);
        assert!(!s.exists(child));
        assert!(!s.exists(grandchild));
        assert!(s.children(section).is_empty());
    }

    #[test]
    fn bounding_rect_follows_scroll() {
        let mut s = HeadlessSurface::new(Vec2::new(800.0, 600.0), 2000.0);
        let el = s.insert("card", None, Rect::new(10.0, 900.0, 100.0, 50.0), None);
        s.set_scroll(500.0);
        assert_eq!(s.bounding_rect(el), Some(Rect::new(10.0, 400.0, 100.0, 50.0)));
        s.set_scroll(10_000.0);
        assert_eq!(s.scroll_offset(), 1400.0);
    }
}
