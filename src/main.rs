use anyhow::{anyhow, Result};
use calloop::timer::{TimeoutAction, Timer};
use calloop::{EventLoop, LoopSignal};
use folio::app::{bindings_from_layout, Page, PageEvent};
use folio::config::Config;
use folio::features::form::ContactForm;
use folio::features::theme::ThemeStore;
use folio::gfx::math::Vec2;
use folio::storage::{FilePreferences, MemoryPreferences, PreferenceStorage};
use folio::surface::headless::HeadlessSurface;
use folio::surface::{ElementId, Surface};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Scripted input replayed against the headless page.
#[derive(Debug, Clone, Copy)]
enum Step {
    Point(&'static str),
    Leave(&'static str),
    Press(&'static str),
    Type(&'static str, &'static str),
    Scroll(f32),
    Resize(f32, f32),
    ToggleTheme,
    SystemDark(bool),
    Submit,
}

const SCRIPT: &[(f64, Step)] = &[
    (400.0, Step::Point("hero-cta")),
    (700.0, Step::Press("hero-cta")),
    (1200.0, Step::Leave("hero-cta")),
    (4200.0, Step::Scroll(700.0)),
    (5000.0, Step::Point("project-card")),
    (5600.0, Step::Leave("project-card")),
    (6000.0, Step::Scroll(1500.0)),
    (6100.0, Step::Press("filter-talks")),
    (6300.0, Step::Press("filter-all")),
    (6500.0, Step::ToggleTheme),
    (7000.0, Step::Scroll(2600.0)),
    (7400.0, Step::Type("email-input", "ada@example.")),
    (7600.0, Step::Type("email-input", "ada@example.org")),
    (8000.0, Step::Submit),
    (8600.0, Step::Resize(900.0, 800.0)),
    (9000.0, Step::SystemDark(true)),
    (9400.0, Step::Scroll(0.0)),
];

struct Demo {
    page: Page,
    surface: HeadlessSurface,
    started: Instant,
    next_step: usize,
    frames: u64,
    run_ms: f64,
    signal: LoopSignal,
}

impl Demo {
    fn center(&self, name: &str) -> Option<(ElementId, Vec2)> {
        let element = self.surface.find(name)?;
        let rect = self.surface.bounding_rect(element)?;
        Some((element, rect.center()))
    }

    fn event_for(&self, step: Step) -> Option<PageEvent> {
        match step {
            Step::Point(name) => self
                .center(name)
                .map(|(element, pos)| PageEvent::PointerEnter { element, pos }),
            Step::Leave(name) => self
                .surface
                .find(name)
                .map(|element| PageEvent::PointerLeave { element }),
            Step::Press(name) => self
                .center(name)
                .map(|(element, pos)| PageEvent::PointerDown { element, pos }),
            Step::Type(name, value) => self.surface.find(name).map(|element| PageEvent::FieldInput {
                element,
                value: value.to_string(),
            }),
            Step::Scroll(offset) => Some(PageEvent::Scroll { offset }),
            Step::Resize(width, height) => Some(PageEvent::Resize { width, height }),
            Step::ToggleTheme => Some(PageEvent::ToggleTheme),
            Step::SystemDark(dark) => Some(PageEvent::SystemThemeChanged { dark }),
            Step::Submit => Some(PageEvent::Submit(ContactForm::new(
                "Ada",
                "ada@example.org",
                "Project enquiry",
                "I would like to talk about a collaboration.",
            ))),
        }
    }

    fn replay_due(&mut self, now: f64) {
        while let Some((at, step)) = SCRIPT.get(self.next_step).copied() {
            if at > now {
                break;
            }
            self.next_step += 1;

            // the host state changes before the page hears about it
            match step {
                Step::Scroll(offset) => self.surface.set_scroll(offset),
                Step::Resize(width, height) => self.surface.set_viewport(Vec2::new(width, height)),
                Step::Point(name) | Step::Press(name) => {
                    if let Some((_, pos)) = self.center(name) {
                        self.page.handle_event(PageEvent::PointerMove { pos }, &mut self.surface);
                    }
                }
                _ => {}
            }

            match self.event_for(step) {
                Some(event) => {
                    debug!("t={:.0}ms {:?}", now, event);
                    self.page.handle_event(event, &mut self.surface);
                }
                None => warn!("Skipping {:?}: element not in layout", step),
            }
        }
    }

    fn tick(&mut self) {
        let now = self.started.elapsed().as_secs_f64() * 1000.0;
        self.replay_due(now);
        self.page.frame(now, &mut self.surface);
        self.frames += 1;
        if now >= self.run_ms {
            self.signal.stop();
        }
    }
}

fn open_preferences() -> Box<dyn PreferenceStorage> {
    match FilePreferences::open_default() {
        Ok(prefs) => {
            info!("Theme preference stored at {}", prefs.path().display());
            Box::new(prefs)
        }
        Err(e) => {
            warn!("Preferences unavailable, theme changes will not persist: {}", e);
            Box::new(MemoryPreferences::unavailable())
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    info!("Starting folio...");

    let config = Config::load().unwrap_or_default();
    let viewport = Vec2::new(config.viewport.width as f32, config.viewport.height as f32);
    let mut surface = HeadlessSurface::new(viewport, config.document_height);
    let bindings = bindings_from_layout(&config, &mut surface);

    let theme = ThemeStore::load(open_preferences(), config.prefers_dark);
    let mut session = MemoryPreferences::new();
    let page = Page::new(&config, &bindings, theme, &mut session, 0.0, &mut surface);

    let mut event_loop: EventLoop<'_, Demo> = EventLoop::try_new()?;
    let handle = event_loop.handle();
    let frame_interval = Duration::from_secs_f64(1.0 / config.fps_cap.max(1) as f64);

    let mut demo = Demo {
        page,
        surface,
        started: Instant::now(),
        next_step: 0,
        frames: 0,
        run_ms: config.run_seconds.max(0.0) as f64 * 1000.0,
        signal: event_loop.get_signal(),
    };

    let frame_source = handle
        .insert_source(Timer::from_duration(frame_interval), move |_, _, demo: &mut Demo| {
            demo.tick();
            TimeoutAction::ToDuration(frame_interval)
        })
        .map_err(|e| anyhow!("Failed to register frame timer: {}", e.error))?;

    info!("Running for {:.1}s at up to {} fps", config.run_seconds, config.fps_cap);
    event_loop.run(frame_interval, &mut demo, |_| {})?;

    handle.remove(frame_source);
    demo.page.teardown(&mut demo.surface);
    info!(
        "Rendered {} frames, {} surface mutations, theme {}",
        demo.frames,
        demo.surface.mutations(),
        demo.page.theme().get()
    );

    Ok(())
}
