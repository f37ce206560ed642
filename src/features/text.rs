use crate::app::PageEvent;
use crate::config::SplitMode;
use crate::features::reveal::{TriggerOptions, Triggers};
use crate::features::Feature;
use crate::gfx::transform::Transform;
use crate::scheduler::Scheduler;
use crate::surface::{ElementId, Surface};
use log::debug;

pub const FRAGMENT_STAGGER_MS: f64 = 50.0;
pub const CARET_BLINK_MS: f64 = 500.0;
const CARET: &str = "2px solid currentColor";
const NBSP: &str = "\u{a0}";

pub fn split_text(text: &str, mode: SplitMode) -> Vec<String> {
    match mode {
        SplitMode::Chars => text.chars().map(String::from).collect(),
        SplitMode::Words => text.split(' ').map(String::from).collect(),
        SplitMode::Lines => text.split('\n').map(String::from).collect(),
    }
}

fn split_class(mode: SplitMode) -> &'static str {
    match mode {
        SplitMode::Chars => "split-chars",
        SplitMode::Words => "split-words",
        SplitMode::Lines => "split-lines",
    }
}

fn visible_text(fragment: &str) -> &str {
    if fragment == " " {
        NBSP
    } else {
        fragment
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TextTask {
    Type(usize),
    Blink(usize),
    Reveal(ElementId),
}

#[derive(Debug)]
struct Typewriter {
    element: ElementId,
    chars: Vec<char>,
    typed: usize,
    speed_ms: f64,
    caret_visible: bool,
}

pub struct TextEffects {
    typewriters: Vec<Typewriter>,
    tasks: Scheduler<TextTask>,
    reveals: Triggers<()>,
}

impl TextEffects {
    pub fn new(surface: &dyn Surface) -> Self {
        Self {
            typewriters: Vec::new(),
            tasks: Scheduler::new(),
            reveals: Triggers::new(surface),
        }
    }

    /// Clears the element and types its text back one character every
    /// `speed_ms`, then blinks a caret.
    pub fn add_typewriter(
        &mut self,
        element: ElementId,
        speed_ms: f64,
        now: f64,
        surface: &mut dyn Surface,
    ) {
        let text = surface.text(element).unwrap_or_default();
        surface.set_text(element, "");
        surface.set_style(element, "border-right", CARET);
        self.typewriters.push(Typewriter {
            element,
            chars: text.chars().collect(),
            typed: 0,
            speed_ms: speed_ms.max(0.0),
            caret_visible: true,
        });
        self.tasks.schedule(now, TextTask::Type(self.typewriters.len() - 1));
    }

    /// Replaces the element's text with one child per fragment, each with a
    /// 50 ms longer animation delay than the one before.
    pub fn split(&mut self, element: ElementId, mode: SplitMode, surface: &mut dyn Surface) {
        let text = surface.text(element).unwrap_or_default();
        surface.clear_children(element);
        surface.set_text(element, "");
        for (i, fragment) in split_text(&text, mode).iter().enumerate() {
            let span = surface.create_node(element, "span");
            surface.add_class(span, split_class(mode));
            surface.set_style(
                span,
                "animation-delay",
                &format!("{}ms", i as f64 * FRAGMENT_STAGGER_MS),
            );
            surface.set_text(span, visible_text(fragment));
        }
    }

    /// Breaks the text into hidden characters that rise into place one
    /// after another once the element scrolls into view.
    pub fn prepare_reveal(&mut self, element: ElementId, surface: &mut dyn Surface) {
        let text = surface.text(element).unwrap_or_default();
        surface.clear_children(element);
        surface.set_text(element, "");
        let hidden = Transform::translate(0.0, 50.0).to_css();
        for ch in text.chars() {
            let span = surface.create_node(element, "span");
            surface.add_class(span, "char");
            surface.set_style(span, "opacity", "0");
            surface.set_style(span, "transform", &hidden);
            surface.set_style(span, "transition", "all 0.5s ease");
            surface.set_text(span, visible_text(ch.encode_utf8(&mut [0; 4])));
        }
        self.reveals.register(element, TriggerOptions::REVEAL, ());
    }

    fn run(&mut self, task: TextTask, now: f64, surface: &mut dyn Surface) {
        match task {
            TextTask::Type(idx) => {
                let Some(tw) = self.typewriters.get_mut(idx) else {
                    return;
                };
                if tw.typed < tw.chars.len() {
                    tw.typed += 1;
                    let shown: String = tw.chars[..tw.typed].iter().collect();
                    surface.set_text(tw.element, &shown);
                    self.tasks.schedule_after(now, tw.speed_ms, TextTask::Type(idx));
                } else {
                    debug!("typewriter {} finished", tw.element);
                    self.tasks.schedule_after(now, CARET_BLINK_MS, TextTask::Blink(idx));
                }
            }
            TextTask::Blink(idx) => {
                let Some(tw) = self.typewriters.get_mut(idx) else {
                    return;
                };
                tw.caret_visible = !tw.caret_visible;
                let border = if tw.caret_visible { CARET } else { "none" };
                surface.set_style(tw.element, "border-right", border);
                self.tasks.schedule_after(now, CARET_BLINK_MS, TextTask::Blink(idx));
            }
            TextTask::Reveal(span) => {
                surface.set_style(span, "opacity", "1");
                surface.set_style(span, "transform", &Transform::IDENTITY.to_css());
            }
        }
    }
}

impl Feature for TextEffects {
    fn name(&self) -> &'static str {
        "text"
    }

    fn update(&mut self, now: f64, surface: &mut dyn Surface) {
        for (element, ()) in self.reveals.observe(surface) {
            for (i, span) in surface.children(element).into_iter().enumerate() {
                self.tasks
                    .schedule_after(now, i as f64 * FRAGMENT_STAGGER_MS, TextTask::Reveal(span));
            }
        }
        for task in self.tasks.drain_due(now) {
            self.run(task, now, surface);
        }
    }

    fn handle_event(&mut self, _event: &PageEvent, _now: f64, _surface: &mut dyn Surface) -> bool {
        false
    }

    fn is_animating(&self) -> bool {
        !self.tasks.is_empty()
    }

    fn teardown(&mut self, _surface: &mut dyn Surface) {
        self.tasks.clear();
    }
}
