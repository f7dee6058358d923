use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CLASSIC_BOX_FILL: &str = "#e0f7fa";
const CLASSIC_BOX_STROKE: &str = "#00796b";
const CLASSIC_LABEL: &str = "#000000";
const CLASSIC_CONNECTOR: &str = "#ff0000";
const CLASSIC_CANVAS_BACKGROUND: &str = "#ffffff";
const CLASSIC_CANVAS_BORDER: &str = "#cccccc";
const CLASSIC_PAGE_BACKGROUND: &str = "#ffffff";
const CLASSIC_PAGE_TEXT: &str = "#000000";

const BUILTIN_THEMES: &[(&str, &str)] = &[
    ("classic", include_str!("../themes/classic.toml")),
    ("high_contrast", include_str!("../themes/high_contrast.toml")),
    ("slate", include_str!("../themes/slate.toml")),
];

const STROKE_WIDTH: f32 = 2.0;
const LABEL_FONT_SIZE: f32 = 12.0;
const LABEL_FONT_FAMILY: &str = "sans-serif";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_box_fill")]
    pub box_fill: String,
    #[serde(default = "default_box_stroke")]
    pub box_stroke: String,
    #[serde(default = "default_stroke_width")]
    pub box_stroke_width: f32,

    #[serde(default = "default_label")]
    pub label_color: String,
    #[serde(default = "default_label_font_size")]
    pub label_font_size: f32,
    #[serde(default = "default_label_font_family")]
    pub label_font_family: String,

    #[serde(default = "default_connector")]
    pub connector_stroke: String,
    #[serde(default = "default_stroke_width")]
    pub connector_stroke_width: f32,

    #[serde(default = "default_canvas_background")]
    pub canvas_background: String,
    #[serde(default = "default_canvas_border")]
    pub canvas_border: String,
    #[serde(default = "default_page_background")]
    pub page_background: String,
    #[serde(default = "default_page_text")]
    pub page_text: String,
}

fn default_box_fill() -> String {
    CLASSIC_BOX_FILL.to_string()
}
fn default_box_stroke() -> String {
    CLASSIC_BOX_STROKE.to_string()
}
fn default_label() -> String {
    CLASSIC_LABEL.to_string()
}
fn default_connector() -> String {
    CLASSIC_CONNECTOR.to_string()
}
fn default_canvas_background() -> String {
    CLASSIC_CANVAS_BACKGROUND.to_string()
}
fn default_canvas_border() -> String {
    CLASSIC_CANVAS_BORDER.to_string()
}
fn default_page_background() -> String {
    CLASSIC_PAGE_BACKGROUND.to_string()
}
fn default_page_text() -> String {
    CLASSIC_PAGE_TEXT.to_string()
}
fn default_stroke_width() -> f32 {
    STROKE_WIDTH
}
fn default_label_font_size() -> f32 {
    LABEL_FONT_SIZE
}
fn default_label_font_family() -> String {
    LABEL_FONT_FAMILY.to_string()
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    pub fn classic() -> Self {
        Theme {
            box_fill: CLASSIC_BOX_FILL.to_string(),
            box_stroke: CLASSIC_BOX_STROKE.to_string(),
            box_stroke_width: STROKE_WIDTH,
            label_color: CLASSIC_LABEL.to_string(),
            label_font_size: LABEL_FONT_SIZE,
            label_font_family: LABEL_FONT_FAMILY.to_string(),
            connector_stroke: CLASSIC_CONNECTOR.to_string(),
            connector_stroke_width: STROKE_WIDTH,
            canvas_background: CLASSIC_CANVAS_BACKGROUND.to_string(),
            canvas_border: CLASSIC_CANVAS_BORDER.to_string(),
            page_background: CLASSIC_PAGE_BACKGROUND.to_string(),
            page_text: CLASSIC_PAGE_TEXT.to_string(),
        }
    }

    pub fn from_builtin(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        let content = BUILTIN_THEMES
            .iter()
            .find(|(n, _)| *n == normalized)
            .map(|(_, c)| *c)
            .ok_or_else(|| {
                Error::Theme(format!(
                    "Unknown built-in theme '{}'. Available: {}",
                    name,
                    Self::list_builtins().join(", ")
                ))
            })?;
        Self::from_toml(content)
    }

    pub fn list_builtins() -> Vec<&'static str> {
        BUILTIN_THEMES.iter().map(|(n, _)| *n).collect()
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Theme(format!("Failed to parse TOML theme: {}", e)))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::Theme(format!("Failed to parse YAML theme: {}", e)))
    }

    /// Load a theme from a file path, or by built-in name when no such file exists.
    /// Files are tried as TOML first, then YAML.
    pub fn load(name_or_path: &str) -> Result<Self> {
        let path = Path::new(name_or_path);
        if !path.is_file() {
            debug!(name = name_or_path; "Using built-in theme");
            return Self::from_builtin(name_or_path);
        }

        info!(path = name_or_path; "Loading theme file");
        let content = std::fs::read_to_string(path)?;
        if let Ok(theme) = Self::from_toml(&content) {
            Ok(theme)
        } else if let Ok(theme) = Self::from_yaml(&content) {
            Ok(theme)
        } else {
            Err(Error::Theme(format!(
                "Failed to parse theme file as TOML or YAML: {}",
                path.display()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Theme;

    #[test]
    fn from_builtin_accepts_hyphenated_and_case_insensitive_names() {
        let underscore = Theme::from_builtin("high_contrast").expect("underscore variant");
        let hyphen = Theme::from_builtin("High-Contrast").expect("hyphen variant");
        assert_eq!(underscore, hyphen);
    }

    #[test]
    fn every_builtin_parses() {
        for name in Theme::list_builtins() {
            Theme::from_builtin(name).unwrap_or_else(|e| panic!("{name}: {e}"));
        }
    }

    #[test]
    fn classic_builtin_matches_default() {
        assert_eq!(Theme::from_builtin("classic").unwrap(), Theme::default());
    }

    #[test]
    fn unknown_builtin_lists_available_names() {
        let err = Theme::from_builtin("neon").unwrap_err().to_string();
        assert!(err.contains("classic"), "{err}");
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let toml = Theme::from_toml("box_fill = \"#123456\"").unwrap();
        assert_eq!(toml.box_fill, "#123456");
        assert_eq!(toml.connector_stroke, Theme::default().connector_stroke);

        let yaml = Theme::from_yaml("label_font_size: 18.5\n").unwrap();
        assert_eq!(yaml.label_font_size, 18.5);
        assert_eq!(yaml.box_fill, Theme::default().box_fill);
    }

    #[test]
    fn load_reads_yaml_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme.yaml");
        std::fs::write(&path, "connector_stroke: \"#00ff00\"\nbox_stroke_width: 4\n").unwrap();

        let theme = Theme::load(path.to_str().unwrap()).unwrap();
        assert_eq!(theme.connector_stroke, "#00ff00");
        assert_eq!(theme.box_stroke_width, 4.0);
    }

    #[test]
    fn load_falls_back_to_builtin_names() {
        assert_eq!(Theme::load("slate").unwrap(), Theme::from_builtin("slate").unwrap());
    }
}
