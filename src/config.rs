use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Size table key used when a node has no unit kind or an unknown one.
pub const DEFAULT_UNIT_KIND: &str = "DEFAULT";

const UNIT_SIZES: [(&str, f32, f32); 9] = [
    (DEFAULT_UNIT_KIND, 10.0, 10.0),
    ("manufacturer", 18.0, 20.0),
    ("assembler", 10.0, 15.0),
    ("constructor-id", 8.0, 10.0),
    ("miner-mk1", 10.0, 10.0),
    ("foundry", 10.0, 10.0),
    ("smelter", 10.0, 10.0),
    ("refinery", 10.0, 10.0),
    ("oil-extractor", 10.0, 10.0),
];

pub const ELK_ALGORITHM: &str = "elk.algorithm";
pub const ELK_DIRECTION: &str = "elk.direction";
pub const ELK_EDGE_ROUTING: &str = "org.eclipse.elk.edgeRouting";
pub const ELK_SPACING_BASE: &str = "org.eclipse.elk.layered.spacing.baseValue";
pub const ELK_SPACING_EDGE_NODE: &str = "org.eclipse.elk.spacing.edgeNode";

/// Nominal machine footprint, before `GridConfig::unit_scale` is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitSize {
    pub width: f32,
    pub height: f32,
}

pub fn default_unit_sizes() -> BTreeMap<String, UnitSize> {
    UNIT_SIZES
        .iter()
        .map(|(kind, width, height)| {
            (
                kind.to_string(),
                UnitSize {
                    width: *width,
                    height: *height,
                },
            )
        })
        .collect()
}

/// The two box-line variants the planner has shipped over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "camelCase")]
pub enum FlowDiagramStyle {
    BoxLine,
    AlternativeBoxLine,
}

/// Switches that distinguish the box-line variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxStyle {
    pub margins: bool,
    pub arrowheads: bool,
    pub placeholder_diamond: bool,
}

impl BoxStyle {
    pub fn box_line() -> Self {
        Self {
            margins: false,
            arrowheads: false,
            placeholder_diamond: false,
        }
    }

    pub fn alternative() -> Self {
        Self {
            margins: true,
            arrowheads: true,
            placeholder_diamond: true,
        }
    }
}

impl From<FlowDiagramStyle> for BoxStyle {
    fn from(style: FlowDiagramStyle) -> Self {
        match style {
            FlowDiagramStyle::BoxLine => Self::box_line(),
            FlowDiagramStyle::AlternativeBoxLine => Self::alternative(),
        }
    }
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self::alternative()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub unit_scale: f32,
    pub unit_padding: f32,
    pub row_padding: f32,
    pub outer_padding: f32,
    pub top_padding: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            unit_scale: 10.0,
            unit_padding: 15.0,
            row_padding: 30.0,
            outer_padding: 10.0,
            top_padding: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub grid: GridConfig,
    pub margin_x: f32,
    pub placeholder_width: f32,
    pub placeholder_height: f32,
    pub corner_radius: f32,
    pub arrow_length: f32,
    /// Largest machine count a single node may ask for.
    pub max_unit_count: f32,
    pub style: BoxStyle,
    pub unit_sizes: BTreeMap<String, UnitSize>,
    pub layout_options: BTreeMap<String, String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            margin_x: 20.0,
            placeholder_width: 80.0,
            placeholder_height: 80.0,
            corner_radius: 15.0,
            arrow_length: 10.0,
            max_unit_count: 10_000.0,
            style: BoxStyle::default(),
            unit_sizes: default_unit_sizes(),
            layout_options: default_layout_options(),
        }
    }
}

impl LayoutConfig {
    /// Pixel size of one unit of `kind`, falling back to the `DEFAULT` entry.
    pub fn unit_size(&self, kind: Option<&str>) -> UnitSize {
        let nominal = kind
            .and_then(|kind| self.unit_sizes.get(kind))
            .or_else(|| self.unit_sizes.get(DEFAULT_UNIT_KIND))
            .copied()
            .unwrap_or(UnitSize {
                width: 10.0,
                height: 10.0,
            });
        UnitSize {
            width: nominal.width * self.grid.unit_scale,
            height: nominal.height * self.grid.unit_scale,
        }
    }
}

pub fn default_layout_options() -> BTreeMap<String, String> {
    [
        (ELK_ALGORITHM, "org.eclipse.elk.layered"),
        (ELK_EDGE_ROUTING, "ORTHOGONAL"),
        (ELK_SPACING_BASE, "80"),
        (ELK_SPACING_EDGE_NODE, "120"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 500.0,
            height: 300.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::dark();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    text_color: Option<String>,
    light_text_color: Option<String>,
    edge_outline_color: Option<String>,
    node_stroke_width: Option<f32>,
    background: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GridConfigFile {
    unit_scale: Option<f32>,
    unit_padding: Option<f32>,
    row_padding: Option<f32>,
    outer_padding: Option<f32>,
    top_padding: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    style: Option<FlowDiagramStyle>,
    margin_x: Option<f32>,
    placeholder_width: Option<f32>,
    placeholder_height: Option<f32>,
    corner_radius: Option<f32>,
    arrow_length: Option<f32>,
    max_unit_count: Option<f32>,
    grid: Option<GridConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
    unit_sizes: Option<BTreeMap<String, UnitSize>>,
    layout_options: Option<BTreeMap<String, String>>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a JSON (or JSON5) config document on top of the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "light" {
            config.theme = Theme::light();
        } else if theme_name == "dark" || theme_name == "default" {
            config.theme = Theme::dark();
        } else {
            log::warn!(theme = theme_name; "Unknown theme name, keeping default");
        }
        config.render.background = config.theme.background.clone();
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.light_text_color {
            config.theme.light_text_color = v;
        }
        if let Some(v) = vars.edge_outline_color {
            config.theme.edge_outline_color = v;
        }
        if let Some(v) = vars.node_stroke_width {
            config.theme.node_stroke_width = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.style {
            config.layout.style = v.into();
        }
        if let Some(v) = layout.margin_x {
            config.layout.margin_x = v;
        }
        if let Some(v) = layout.placeholder_width {
            config.layout.placeholder_width = v;
        }
        if let Some(v) = layout.placeholder_height {
            config.layout.placeholder_height = v;
        }
        if let Some(v) = layout.corner_radius {
            config.layout.corner_radius = v;
        }
        if let Some(v) = layout.arrow_length {
            config.layout.arrow_length = v;
        }
        if let Some(v) = layout.max_unit_count {
            config.layout.max_unit_count = v;
        }
        if let Some(grid) = layout.grid {
            if let Some(v) = grid.unit_scale {
                config.layout.grid.unit_scale = v;
            }
            if let Some(v) = grid.unit_padding {
                config.layout.grid.unit_padding = v;
            }
            if let Some(v) = grid.row_padding {
                config.layout.grid.row_padding = v;
            }
            if let Some(v) = grid.outer_padding {
                config.layout.grid.outer_padding = v;
            }
            if let Some(v) = grid.top_padding {
                config.layout.grid.top_padding = v;
            }
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.background {
            config.render.background = v;
        }
    }

    if let Some(sizes) = parsed.unit_sizes {
        config.layout.unit_sizes.extend(sizes);
    }

    if let Some(options) = parsed.layout_options {
        config.layout.layout_options.extend(options);
    }

    Ok(config)
}
