use crate::config::{Config, EffectKind, ElementConfig};
use crate::features::counters::CounterController;
use crate::features::filter::ProjectFilter;
use crate::features::floating::FloatingElements;
use crate::features::form::{ContactForm, ContactFormController};
use crate::features::hover::{CursorFollower, HoverEffects};
use crate::features::lazy::LazyImages;
use crate::features::loading::{first_visit, LoadingScreen};
use crate::features::particles::ParticleField;
use crate::features::reveal::RevealController;
use crate::features::scroll::ScrollEffects;
use crate::features::text::TextEffects;
use crate::features::theme::{self, ThemeStore};
use crate::features::Feature;
use crate::gfx::math::Vec2;
use crate::storage::PreferenceStorage;
use crate::surface::headless::HeadlessSurface;
use crate::surface::{ElementId, Surface};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Input delivered by the host. The host updates the surface (scroll
/// offset, viewport) before delivering the matching event.
#[derive(Debug, Clone)]
pub enum PageEvent {
    PointerMove { pos: Vec2 },
    PointerEnter { element: ElementId, pos: Vec2 },
    PointerLeave { element: ElementId },
    PointerDown { element: ElementId, pos: Vec2 },
    Scroll { offset: f32 },
    Resize { width: f32, height: f32 },
    ToggleTheme,
    SystemThemeChanged { dark: bool },
    Submit(ContactForm),
    FieldInput { element: ElementId, value: String },
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub element: ElementId,
    pub config: ElementConfig,
}

/// Lays out `config.elements` on a headless surface and returns the
/// effect bindings in document order.
pub fn bindings_from_layout(config: &Config, surface: &mut HeadlessSurface) -> Vec<Binding> {
    let mut bindings = Vec::new();
    for entry in &config.elements {
        let parent = match entry.parent.as_deref() {
            Some(name) => {
                let found = surface.find(name);
                if found.is_none() {
                    warn!("Element {} names unknown parent {}", entry.name, name);
                }
                found
            }
            None => None,
        };
        let element = surface.insert(&entry.name, parent, entry.rect, entry.text.as_deref());
        bindings.extend(entry.effects.iter().map(|config| Binding {
            element,
            config: config.clone(),
        }));
    }
    bindings
}

pub struct Page {
    theme: ThemeStore,
    features: Vec<Box<dyn Feature>>,
    theme_toggles: Vec<ElementId>,
    time: f64,
}

impl Page {
    pub fn new(
        config: &Config,
        bindings: &[Binding],
        mut theme: ThemeStore,
        session: &mut dyn PreferenceStorage,
        now: f64,
        surface: &mut dyn Surface,
    ) -> Self {
        let viewport = surface.viewport();
        let mut fields = Vec::new();
        let mut reveal = RevealController::new(surface);
        let mut counters = CounterController::new(surface);
        let mut text = TextEffects::new(surface);
        let mut hover = HoverEffects::new();
        let mut scroll = ScrollEffects::new();
        let mut form = ContactFormController::new();
        let mut floating = FloatingElements::new();
        let mut filter = ProjectFilter::new();
        let mut lazy = LazyImages::new(surface);

        let mut stagger_index: BTreeMap<String, usize> = BTreeMap::new();
        let mut hero = Vec::new();
        let mut code_blocks = Vec::new();
        let mut charts = Vec::new();
        let mut theme_toggles = Vec::new();
        let (mut cursor, mut follower) = (None, None);
        let mut cursor_targets = Vec::new();
        let mut sections = BTreeMap::new();
        let mut nav_links = Vec::new();

        for Binding { element, config: cfg } in bindings {
            let element = *element;
            match &cfg.kind {
                EffectKind::Particles => {
                    if config.particles_enabled {
                        let mut field = ParticleField::new(element, viewport);
                        field.start(surface);
                        fields.push(field);
                    }
                }
                EffectKind::Reveal { .. } | EffectKind::ScrollMarker | EffectKind::StaggerList => {
                    reveal.register(element, cfg, 0, surface)
                }
                EffectKind::StaggerReveal { class } => {
                    let index = stagger_index.entry(class.clone()).or_insert(0);
                    reveal.register(element, cfg, *index, surface);
                    *index += 1;
                }
                EffectKind::Entrance => hero.push(element),
                EffectKind::Counter { start, target } => {
                    counters.register_counter(element, *start, *target, cfg.duration_ms, cfg.threshold)
                }
                EffectKind::Progress { percent } => {
                    counters.register_progress(element, *percent, cfg.duration_ms, cfg.threshold)
                }
                EffectKind::Typewriter => {
                    text.add_typewriter(element, cfg.typewriter_speed_ms, now + cfg.delay_ms, surface)
                }
                EffectKind::Split => text.split(element, cfg.split, surface),
                EffectKind::TextReveal => text.prepare_reveal(element, surface),
                EffectKind::Hover { effect } => hover.add_hover(element, *effect),
                EffectKind::Magnetic { strength } => hover.add_magnetic(element, *strength),
                EffectKind::Button => {
                    hover.add_button(element);
                    cursor_targets.push(element);
                }
                EffectKind::Card => {
                    hover.add_card(element);
                    cursor_targets.push(element);
                }
                EffectKind::Floating => floating.add_container(element, surface),
                EffectKind::FilterButton { filter: value } => filter.add_button(element, value),
                EffectKind::FilterItem { category } => filter.add_item(element, category),
                EffectKind::Section { id } => {
                    sections.insert(id.clone(), element);
                }
                EffectKind::NavLink { section } => nav_links.push((element, section.clone())),
                EffectKind::LazyImage { src } => lazy.add(element, src, surface),
                EffectKind::Parallax => scroll.add_parallax(element, cfg.parallax_speed, surface),
                EffectKind::ScrollProgress => scroll.set_progress_bar(element),
                EffectKind::Header => {
                    scroll.set_header(element);
                    theme.on_change(theme::header_tint(element));
                }
                EffectKind::CodeBlock => code_blocks.push(element),
                EffectKind::Chart => charts.push(element),
                EffectKind::ThemeToggle => {
                    theme.on_change(theme::toggle_icon(element));
                    theme_toggles.push(element);
                }
                EffectKind::ThemeColor => theme.on_change(theme::meta_color(element)),
                EffectKind::Cursor => cursor = Some(element),
                EffectKind::CursorFollower => follower = Some(element),
                EffectKind::CursorTarget => cursor_targets.push(element),
                EffectKind::Form => debug!("contact form at {}", element),
                EffectKind::FormField { field } => form.bind_input(*field, element, surface),
                EffectKind::FormError { field } => form.bind_error(*field, element),
                EffectKind::SubmitButton => {
                    form.bind_submit(element);
                    cursor_targets.push(element);
                }
            }
        }

        for (link, id) in nav_links {
            match sections.get(&id) {
                Some(section) => scroll.add_nav_section(*section, link, surface),
                None => warn!("Nav link {} points at unknown section {}", link, id),
            }
        }
        scroll.highlight_nav(surface);

        if !code_blocks.is_empty() {
            theme.on_change(theme::code_blocks(code_blocks));
        }
        if !charts.is_empty() {
            theme.on_change(theme::charts(charts));
        }
        theme.apply(surface);

        let mut features: Vec<Box<dyn Feature>> = Vec::new();
        if config.loading_screen && first_visit(session) {
            let mut loading = LoadingScreen::new(&config.title, hero);
            loading.show(now, surface);
            features.push(Box::new(loading));
        } else {
            reveal.play_entrance(now, &hero);
        }
        for field in fields {
            features.push(Box::new(field));
        }
        if !floating.is_empty() {
            features.push(Box::new(floating));
        }
        features.push(Box::new(reveal));
        features.push(Box::new(lazy));
        features.push(Box::new(counters));
        features.push(Box::new(text));
        features.push(Box::new(hover));
        features.push(Box::new(filter));
        if (cursor.is_some() || follower.is_some()) && surface.has_fine_pointer() {
            features.push(Box::new(CursorFollower::new(cursor, follower, cursor_targets)));
        }
        features.push(Box::new(scroll));
        features.push(Box::new(form));

        info!(
            "Page wired: {} bindings, features [{}]",
            bindings.len(),
            features.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ")
        );

        Self {
            theme,
            features,
            theme_toggles,
            time: now,
        }
    }

    pub fn theme(&self) -> &ThemeStore {
        &self.theme
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name()).collect()
    }

    /// Dispatches to every controller. Returns whether any consumed it.
    pub fn handle_event(&mut self, event: PageEvent, surface: &mut dyn Surface) -> bool {
        let now = self.time;
        let mut handled = match &event {
            PageEvent::ToggleTheme => {
                self.theme.toggle(surface);
                true
            }
            PageEvent::SystemThemeChanged { dark } => self.theme.system_changed(*dark, surface),
            PageEvent::PointerDown { element, .. } if self.theme_toggles.contains(element) => {
                self.theme.toggle(surface);
                true
            }
            _ => false,
        };
        for feature in &mut self.features {
            handled |= feature.handle_event(&event, now, surface);
        }
        handled
    }

    /// One refresh tick. Returns whether anything is still animating.
    pub fn frame(&mut self, now: f64, surface: &mut dyn Surface) -> bool {
        self.time = self.time.max(now);
        let mut animating = false;
        for feature in &mut self.features {
            feature.update(self.time, surface);
            animating |= feature.is_animating();
        }
        animating
    }

    pub fn teardown(&mut self, surface: &mut dyn Surface) {
        for feature in &mut self.features {
            feature.teardown(surface);
        }
        info!("Page torn down after {:.0} ms", self.time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ElementEntry;
    use crate::features::theme::{Theme, STORAGE_KEY};
    use crate::gfx::math::Rect;
    use crate::storage::MemoryPreferences;

    fn entry(name: &str, rect: Rect, text: Option<&str>, effects: Vec<EffectKind>) -> ElementEntry {
        ElementEntry {
            name: name.to_string(),
            parent: None,
            rect,
            text: text.map(String::from),
            effects: effects.into_iter().map(ElementConfig::new).collect(),
        }
    }

    fn config() -> Config {
        Config {
            elements: vec![
                entry("header", Rect::new(0.0, 0.0, 1280.0, 80.0), None, vec![EffectKind::Header]),
                entry("particles", Rect::new(0.0, 0.0, 1280.0, 800.0), None, vec![EffectKind::Particles]),
                entry(
                    "hero-title",
                    Rect::new(100.0, 200.0, 600.0, 80.0),
                    Some("Hello"),
                    vec![EffectKind::Entrance],
                ),
                entry("toggle", Rect::new(1200.0, 20.0, 40.0, 40.0), None, vec![EffectKind::ThemeToggle]),
                entry(
                    "stat",
                    Rect::new(100.0, 1800.0, 100.0, 40.0),
                    Some("0"),
                    vec![EffectKind::Counter { start: 0, target: 42 }],
                ),
                entry("cursor", Rect::default(), None, vec![EffectKind::Cursor]),
            ],
            ..Config::default()
        }
    }

    fn build(session: &mut MemoryPreferences) -> (HeadlessSurface, Vec<Binding>, Page) {
        let config = config();
        let mut surface = HeadlessSurface::new(Vec2::new(1280.0, 800.0), 4200.0);
        let bindings = bindings_from_layout(&config, &mut surface);
        let theme = ThemeStore::load(Box::new(MemoryPreferences::new()), false);
        let page = Page::new(&config, &bindings, theme, session, 0.0, &mut surface);
        (surface, bindings, page)
    }

    #[test]
    fn layout_becomes_bindings() {
        let config = config();
        let mut surface = HeadlessSurface::new(Vec2::new(1280.0, 800.0), 4200.0);
        let bindings = bindings_from_layout(&config, &mut surface);
        assert_eq!(bindings.len(), 6);
        assert_eq!(surface.find("stat"), Some(bindings[4].element));
        assert_eq!(surface.text(bindings[2].element).as_deref(), Some("Hello"));
    }

    #[test]
    fn first_visit_shows_the_loading_screen_once() {
        let mut session = MemoryPreferences::new();
        let (_, _, page) = build(&mut session);
        assert_eq!(page.feature_names()[0], "loading");

        let (mut surface, _, mut page) = build(&mut session);
        assert!(!page.feature_names().contains(&"loading"));
        let title = surface.find("hero-title").unwrap();
        page.frame(0.0, &mut surface);
        assert!(surface.has_class(title, "entrance-animate"));
    }

    #[test]
    fn clicking_the_toggle_switches_theme() {
        let mut session = MemoryPreferences::new().with_value("visited", "true");
        let (mut surface, _, mut page) = build(&mut session);
        let toggle = surface.find("toggle").unwrap();
        let header = surface.find("header").unwrap();
        assert_eq!(surface.text(toggle).as_deref(), Some("🌙"));

        let click = PageEvent::PointerDown {
            element: toggle,
            pos: Vec2::new(1210.0, 30.0),
        };
        assert!(page.handle_event(click, &mut surface));
        assert_eq!(page.theme().get(), Theme::Dark);
        assert_eq!(surface.style(header, "background"), Some("rgba(17, 24, 39, 0.8)"));
        assert_eq!(surface.text(toggle).as_deref(), Some("☀️"));
        assert!(!page.handle_event(PageEvent::SystemThemeChanged { dark: false }, &mut surface));
    }

    #[test]
    fn scrolling_starts_counters_and_teardown_clears_particles() {
        let mut session = MemoryPreferences::new().with_value("visited", "true");
        let (mut surface, _, mut page) = build(&mut session);
        let stat = surface.find("stat").unwrap();
        let particles = surface.find("particles").unwrap();
        assert_eq!(surface.children(particles).len(), 80);

        assert!(page.frame(16.0, &mut surface));
        surface.set_scroll(1200.0);
        page.handle_event(PageEvent::Scroll { offset: 1200.0 }, &mut surface);
        page.frame(32.0, &mut surface);
        page.frame(2100.0, &mut surface);
        assert_eq!(surface.text(stat).as_deref(), Some("42"));

        page.teardown(&mut surface);
        assert!(surface.children(particles).is_empty());
    }

    #[test]
    fn no_cursor_without_a_fine_pointer() {
        let config = config();
        let mut surface = HeadlessSurface::new(Vec2::new(1280.0, 800.0), 4200.0);
        surface.set_fine_pointer(false);
        let bindings = bindings_from_layout(&config, &mut surface);
        let theme = ThemeStore::load(
            Box::new(MemoryPreferences::new().with_value(STORAGE_KEY, "dark")),
            false,
        );
        let mut session = MemoryPreferences::new();
        let page = Page::new(&config, &bindings, theme, &mut session, 0.0, &mut surface);
        assert!(!page.feature_names().contains(&"cursor"));
        assert_eq!(surface.attribute(HeadlessSurface::ROOT, "data-theme"), Some("dark"));
    }

    #[test]
    fn nav_links_and_project_filters_are_wired() {
        let config = Config {
            elements: vec![
                entry("home", Rect::new(0.0, 0.0, 1280.0, 800.0), None, vec![EffectKind::Section { id: "home".into() }]),
                entry("work", Rect::new(0.0, 800.0, 1280.0, 1200.0), None, vec![EffectKind::Section { id: "work".into() }]),
                entry("nav-home", Rect::default(), None, vec![EffectKind::NavLink { section: "home".into() }]),
                entry("nav-work", Rect::default(), None, vec![EffectKind::NavLink { section: "work".into() }]),
                entry("only-talks", Rect::default(), None, vec![EffectKind::FilterButton { filter: "talks".into() }]),
                entry(
                    "shop",
                    Rect::new(0.0, 900.0, 400.0, 300.0),
                    None,
                    vec![EffectKind::FilterItem { category: "web".into() }],
                ),
            ],
            loading_screen: false,
            ..Config::default()
        };
        let mut surface = HeadlessSurface::new(Vec2::new(1280.0, 800.0), 4200.0);
        let bindings = bindings_from_layout(&config, &mut surface);
        let theme = ThemeStore::load(Box::new(MemoryPreferences::new()), false);
        let mut page = Page::new(&config, &bindings, theme, &mut MemoryPreferences::new(), 0.0, &mut surface);
        let (nav_home, nav_work) = (surface.find("nav-home").unwrap(), surface.find("nav-work").unwrap());
        assert!(surface.has_class(nav_home, "active"));

        surface.set_scroll(900.0);
        page.handle_event(PageEvent::Scroll { offset: 900.0 }, &mut surface);
        assert!(surface.has_class(nav_work, "active"));
        assert!(!surface.has_class(nav_home, "active"));

        let button = surface.find("only-talks").unwrap();
        let shop = surface.find("shop").unwrap();
        assert!(page.handle_event(PageEvent::PointerDown { element: button, pos: Vec2::ZERO }, &mut surface));
        page.frame(400.0, &mut surface);
        assert_eq!(surface.style(shop, "display"), Some("none"));
    }
}
