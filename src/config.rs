use crate::features::form::Field;
use crate::gfx::math::Rect;
use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_LAYOUT: &str = include_str!("../assets/page.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Shown on the loading screen.
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_viewport")]
    pub viewport: Size,

    #[serde(default = "default_document_height")]
    pub document_height: f32,

    #[serde(default = "default_fps_cap")]
    pub fps_cap: u32,

    #[serde(default = "default_true")]
    pub particles_enabled: bool,

    #[serde(default = "default_true")]
    pub loading_screen: bool,

    /// Operating system color scheme as reported to the page.
    #[serde(default)]
    pub prefers_dark: bool,

    /// How long the headless demo runs before tearing the page down.
    #[serde(default = "default_run_seconds")]
    pub run_seconds: f32,

    #[serde(default = "default_elements")]
    pub elements: Vec<ElementEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub effects: Vec<ElementConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementConfig {
    #[serde(flatten)]
    pub kind: EffectKind,
    #[serde(default)]
    pub delay_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stagger_ms: Option<f64>,
    #[serde(default = "default_parallax_speed")]
    pub parallax_speed: f32,
    #[serde(default = "default_typewriter_speed")]
    pub typewriter_speed_ms: f64,
    #[serde(default)]
    pub split: SplitMode,
}

impl ElementConfig {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            delay_ms: 0.0,
            duration_ms: None,
            threshold: None,
            stagger_ms: None,
            parallax_speed: default_parallax_speed(),
            typewriter_speed_ms: default_typewriter_speed(),
            split: SplitMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectKind {
    Particles,
    /// Entrance class `animate-<animation>` once scrolled into view.
    Reveal { animation: String },
    /// Reveal class added with a per-index stagger within its group.
    StaggerReveal { class: String },
    /// Marker class `aos-animate` once scrolled into view.
    ScrollMarker,
    StaggerList,
    Entrance,
    Counter {
        #[serde(default)]
        start: i64,
        target: i64,
    },
    Progress { percent: f32 },
    Typewriter,
    Split,
    TextReveal,
    Hover { effect: HoverKind },
    Magnetic {
        #[serde(default = "default_magnetic_strength")]
        strength: f32,
    },
    /// Ripple on click plus a magnetic follow.
    Button,
    /// Child fragments stagger in while hovered.
    Card,
    /// Drifting shapes that shy away from the pointer.
    Floating,
    FilterButton { filter: String },
    FilterItem { category: String },
    /// Anchor target for nav highlighting.
    Section { id: String },
    NavLink { section: String },
    LazyImage { src: String },
    Parallax,
    ScrollProgress,
    Header,
    CodeBlock,
    Chart,
    ThemeToggle,
    /// `theme-color` meta tag.
    ThemeColor,
    Cursor,
    CursorFollower,
    CursorTarget,
    Form,
    FormField { field: Field },
    FormError { field: Field },
    SubmitButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoverKind {
    Lift,
    Scale,
    Rotate,
    Glow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    #[default]
    Chars,
    Words,
    Lines,
}

#[derive(Debug, Deserialize)]
struct Layout {
    elements: Vec<ElementEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: default_title(),
            viewport: default_viewport(),
            document_height: default_document_height(),
            fps_cap: default_fps_cap(),
            particles_enabled: true,
            loading_screen: true,
            prefers_dark: false,
            run_seconds: default_run_seconds(),
            elements: default_elements(),
        }
    }
}

fn default_title() -> String {
    "Portfolio".to_string()
}

fn default_viewport() -> Size {
    Size {
        width: 1280,
        height: 800,
    }
}

fn default_document_height() -> f32 {
    4200.0
}

fn default_fps_cap() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

fn default_run_seconds() -> f32 {
    12.0
}

fn default_parallax_speed() -> f32 {
    0.5
}

fn default_magnetic_strength() -> f32 {
    0.3
}

fn default_typewriter_speed() -> f64 {
    100.0
}

fn default_elements() -> Vec<ElementEntry> {
    match toml::from_str::<Layout>(DEFAULT_LAYOUT) {
        Ok(layout) => layout.elements,
        Err(e) => {
            warn!("Bundled page layout is invalid: {}", e);
            Vec::new()
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join("folio").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// A missing file is created with the defaults so there is something to
    /// edit next time.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            return Ok(config);
        }
        let config = Config::default();
        match config.save_to(path) {
            Ok(()) => info!("Wrote default config to {}", path.display()),
            Err(e) => warn!("Could not write default config: {:#}", e),
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_layout_parses() {
        let layout: Layout = toml::from_str(DEFAULT_LAYOUT).unwrap();
        assert!(!layout.elements.is_empty());
        assert!(layout
            .elements
            .iter()
            .flat_map(|e| &e.effects)
            .any(|c| c.kind == EffectKind::Particles));
    }

    #[test]
    fn element_config_defaults_apply() {
        let entry: ElementEntry = toml::from_str(
            r#"
            name = "stat"
            rect = { x = 0.0, y = 10.0, width = 100.0, height = 40.0 }
            effects = [{ kind = "counter", target = 150, threshold = 0.5 }]
            "#,
        )
        .unwrap();
        let effect = &entry.effects[0];
        assert_eq!(effect.kind, EffectKind::Counter { start: 0, target: 150 });
        assert_eq!(effect.threshold, Some(0.5));
        assert_eq!(effect.duration_ms, None);
        assert_eq!(effect.parallax_speed, 0.5);
        assert_eq!(effect.split, SplitMode::Chars);
    }

    #[test]
    fn magnetic_strength_defaults() {
        let config: ElementConfig = toml::from_str(r#"kind = "magnetic""#).unwrap();
        assert_eq!(config.kind, EffectKind::Magnetic { strength: 0.3 });
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: Config = toml::from_str("fps_cap = 30\nelements = []").unwrap();
        assert_eq!(config.fps_cap, 30);
        assert_eq!(config.viewport.width, 1280);
        assert!(config.particles_enabled);
        assert!(config.elements.is_empty());
    }

    #[test]
    fn first_load_writes_editable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());

        let edited = std::fs::read_to_string(&path)
            .unwrap()
            .replace("fps_cap = 60", "fps_cap = 24");
        std::fs::write(&path, edited).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.fps_cap, 24);
        assert_eq!(reloaded.elements.len(), config.elements.len());
    }

    #[test]
    fn malformed_config_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "fps_cap = \"fast\"").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("config.toml"));
    }
}
