use crate::canvas::{EdgeStyle, LineStyle};
use crate::layout::SizeMode;
use crate::theme::Theme;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Distance between the parent and its children, and between siblings.
    pub gap: f32,
    pub size_mode: SizeMode,
    /// Host node kind used for new children.
    pub node_kind: String,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            gap: 20.0,
            size_mode: SizeMode::MatchParent,
            node_kind: "rectangle".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            padding: 24.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub placement: PlacementConfig,
    pub edge: EdgeStyle,
    pub theme: Theme,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    node_fill: Option<String>,
    node_stroke: Option<String>,
    node_text_color: Option<String>,
    id_text_color: Option<String>,
    untyped_fill: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PlacementConfigFile {
    gap: Option<f32>,
    size_mode: Option<SizeMode>,
    node_kind: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct EdgeConfigFile {
    arrow_start: Option<bool>,
    arrow_end: Option<bool>,
    line: Option<LineStyle>,
    color: Option<String>,
    width: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    padding: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    placement: Option<PlacementConfigFile>,
    edge: Option<EdgeConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let is_json5 = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json5"))
        .unwrap_or(false);
    parse_config(&contents, is_json5).with_context(|| format!("parsing config {}", path.display()))
}

/// Parse config text. Strict JSON is tried first unless `json5` is set; JSON5
/// (comments, trailing commas, unquoted keys) is the fallback.
pub fn parse_config(contents: &str, json5: bool) -> anyhow::Result<Config> {
    let parsed: ConfigFile = if json5 {
        json5::from_str(contents)?
    } else {
        match serde_json::from_str(contents) {
            Ok(parsed) => parsed,
            Err(strict_err) => json5::from_str(contents).map_err(|_| strict_err)?,
        }
    };
    Ok(merge_config(Config::default(), parsed))
}

fn merge_config(mut config: Config, parsed: ConfigFile) -> Config {
    if let Some(theme) = parsed.theme.as_deref().and_then(Theme::by_name) {
        config.theme = theme;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.node_fill {
            config.theme.node_fill = v;
        }
        if let Some(v) = vars.node_stroke {
            config.theme.node_stroke = v;
        }
        if let Some(v) = vars.node_text_color {
            config.theme.node_text_color = v;
        }
        if let Some(v) = vars.id_text_color {
            config.theme.id_text_color = v;
        }
        if let Some(v) = vars.untyped_fill {
            config.theme.untyped_fill = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(placement) = parsed.placement {
        if let Some(v) = placement.gap {
            config.placement.gap = v;
        }
        if let Some(v) = placement.size_mode {
            config.placement.size_mode = v;
        }
        if let Some(v) = placement.node_kind {
            config.placement.node_kind = v;
        }
    }

    if let Some(edge) = parsed.edge {
        if let Some(v) = edge.arrow_start {
            config.edge.arrow_start = v;
        }
        if let Some(v) = edge.arrow_end {
            config.edge.arrow_end = v;
        }
        if let Some(v) = edge.line {
            config.edge.line = v;
        }
        if let Some(v) = edge.color {
            config.edge.color = v;
        }
        if let Some(v) = edge.width {
            config.edge.width = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.padding {
            config.render.padding = v;
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_keeps_defaults() {
        let config = parse_config("{}", false).unwrap();
        assert_eq!(config.placement.gap, 20.0);
        assert_eq!(config.placement.size_mode, SizeMode::MatchParent);
        assert!(config.edge.arrow_end);
    }

    #[test]
    fn strict_json_overrides_fields() {
        let config = parse_config(
            r##"{"theme":"classic","placement":{"gap":12.5,"sizeMode":"fitParent"},"edge":{"line":"dashed","color":"#f00"}}"##,
            false,
        )
        .unwrap();
        assert_eq!(config.placement.gap, 12.5);
        assert_eq!(config.placement.size_mode, SizeMode::FitParent);
        assert_eq!(config.edge.line, LineStyle::Dashed);
        assert_eq!(config.edge.color, "#f00");
        assert_eq!(config.theme.font_size, 16.0);
    }

    #[test]
    fn json5_is_accepted_as_fallback() {
        let config = parse_config(
            "{\n  // roomier layout\n  placement: { gap: 40, nodeKind: 'ellipse', },\n}",
            false,
        )
        .unwrap();
        assert_eq!(config.placement.gap, 40.0);
        assert_eq!(config.placement.node_kind, "ellipse");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_config("not a config", false).is_err());
    }
}
