use crate::storage::PreferenceStorage;
use crate::surface::{ElementId, Surface};
use log::{info, warn};
use std::fmt;

pub const STORAGE_KEY: &str = "portfolio-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn meta_color(self) -> &'static str {
        match self {
            Theme::Light => "#f8f9fa",
            Theme::Dark => "#111827",
        }
    }

    /// Icon for the toggle: the theme it would switch to.
    pub fn toggle_icon(self) -> &'static str {
        match self {
            Theme::Light => "🌙",
            Theme::Dark => "☀️",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type ThemeListener = Box<dyn FnMut(Theme, &mut dyn Surface)>;

pub struct ThemeStore {
    storage: Box<dyn PreferenceStorage>,
    current: Theme,
    explicit: bool,
    listeners: Vec<ThemeListener>,
}

impl ThemeStore {
    /// Resolves the initial theme: persisted choice, then the system color
    /// scheme, then light.
    pub fn load(storage: Box<dyn PreferenceStorage>, system_dark: bool) -> Self {
        let persisted = match storage.get(STORAGE_KEY) {
            Ok(value) => value.as_deref().and_then(Theme::from_name),
            Err(e) => {
                warn!("Could not read theme preference: {}", e);
                None
            }
        };
        let current = persisted.unwrap_or(if system_dark { Theme::Dark } else { Theme::Light });
        info!(
            "Theme resolved to {} ({})",
            current,
            if persisted.is_some() { "saved" } else { "system" }
        );
        Self {
            storage,
            current,
            explicit: persisted.is_some(),
            listeners: Vec::new(),
        }
    }

    pub fn get(&self) -> Theme {
        self.current
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn on_change(&mut self, listener: ThemeListener) {
        self.listeners.push(listener);
    }

    pub fn apply(&mut self, surface: &mut dyn Surface) {
        let root = surface.root();
        surface.set_attribute(root, "data-theme", self.current.as_str());
        for listener in &mut self.listeners {
            listener(self.current, surface);
        }
    }

    /// Records an explicit choice. A storage failure is logged and the
    /// choice still applies for the rest of the session.
    pub fn set(&mut self, theme: Theme, surface: &mut dyn Surface) {
        self.current = theme;
        self.explicit = true;
        if let Err(e) = self.storage.set(STORAGE_KEY, theme.as_str()) {
            warn!("Could not persist theme preference: {}", e);
        }
        info!("Theme set to {}", theme);
        self.apply(surface);
    }

    pub fn toggle(&mut self, surface: &mut dyn Surface) -> Theme {
        let next = self.current.toggled();
        self.set(next, surface);
        next
    }

    /// Follows the system scheme unless the user already chose.
    pub fn system_changed(&mut self, dark: bool, surface: &mut dyn Surface) -> bool {
        if self.explicit {
            return false;
        }
        let theme = if dark { Theme::Dark } else { Theme::Light };
        if theme == self.current {
            return false;
        }
        self.current = theme;
        info!("Theme follows system scheme: {}", theme);
        self.apply(surface);
        true
    }
}

pub fn header_tint(header: ElementId) -> ThemeListener {
    Box::new(move |theme: Theme, surface: &mut dyn Surface| {
        let background = match theme {
            Theme::Dark => "rgba(17, 24, 39, 0.8)",
            Theme::Light => "rgba(248, 249, 250, 0.8)",
        };
        surface.set_style(header, "background", background);
    })
}

pub fn code_blocks(blocks: Vec<ElementId>) -> ThemeListener {
    Box::new(move |theme: Theme, surface: &mut dyn Surface| {
        let (background, color) = match theme {
            Theme::Dark => ("#1f2937", "#f9fafb"),
            Theme::Light => ("#f3f4f6", "#111827"),
        };
        for block in &blocks {
            surface.set_style(*block, "background-color", background);
            surface.set_style(*block, "color", color);
        }
    })
}

pub fn charts(charts: Vec<ElementId>) -> ThemeListener {
    Box::new(move |theme: Theme, surface: &mut dyn Surface| {
        for chart in &charts {
            surface.set_attribute(*chart, "data-theme", theme.as_str());
        }
    })
}

pub fn meta_color(meta: ElementId) -> ThemeListener {
    Box::new(move |theme: Theme, surface: &mut dyn Surface| {
        surface.set_attribute(meta, "content", theme.meta_color())
    })
}

pub fn toggle_icon(toggle: ElementId) -> ThemeListener {
    Box::new(move |theme: Theme, surface: &mut dyn Surface| {
        surface.set_text(toggle, theme.toggle_icon())
    })
}
