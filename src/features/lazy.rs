use crate::app::PageEvent;
use crate::features::reveal::{TriggerOptions, Triggers};
use crate::features::Feature;
use crate::surface::{ElementId, Surface};
use log::debug;

const ON_SCREEN: TriggerOptions = TriggerOptions {
    threshold: 0.0,
    bottom_margin: 0.0,
};

/// Images whose real `src` is only set once they scroll on screen.
pub struct LazyImages {
    triggers: Triggers<String>,
}

impl LazyImages {
    pub fn new(surface: &dyn Surface) -> Self {
        Self {
            triggers: Triggers::new(surface),
        }
    }

    /// Without visibility observation the image loads straight away.
    pub fn add(&mut self, element: ElementId, src: &str, surface: &mut dyn Surface) {
        if self.triggers.register(element, ON_SCREEN, src.to_string()) {
            surface.add_class(element, "lazy");
            surface.set_attribute(element, "data-src", src);
        } else {
            surface.set_attribute(element, "src", src);
        }
    }

    pub fn waiting(&self) -> usize {
        self.triggers.watching()
    }
}

impl Feature for LazyImages {
    fn name(&self) -> &'static str {
        "lazy-images"
    }

    fn update(&mut self, _now: f64, surface: &mut dyn Surface) {
        for (image, src) in self.triggers.observe(surface) {
            debug!("loading {} into {}", src, image);
            surface.set_attribute(image, "src", &src);
            surface.remove_class(image, "lazy");
        }
    }

    fn handle_event(&mut self, _event: &PageEvent, _now: f64, _surface: &mut dyn Surface) -> bool {
        false
    }
}
