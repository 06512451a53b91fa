use boxline_renderer::{Config, FlowDiagramStyle, Theme, render_flow_svg};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowRenderOptions {
    theme: Option<String>,
    style: Option<FlowDiagramStyle>,
    width: Option<f32>,
    height: Option<f32>,
    font_family: Option<String>,
    font_size: Option<f32>,
}

fn build_config(options: FlowRenderOptions) -> Config {
    let mut config = Config::default();
    if options.theme.as_deref() == Some("light") {
        config.theme = Theme::light();
        config.render.background = config.theme.background.clone();
    }
    if let Some(style) = options.style {
        config.layout.style = style.into();
    }
    if let Some(width) = options.width {
        config.render.width = width;
    }
    if let Some(height) = options.height {
        config.render.height = height;
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
    }
    config
}

#[wasm_bindgen]
pub fn render_flow_diagram_svg(flow_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<FlowRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        FlowRenderOptions::default()
    };

    render_flow_svg(flow_json, &build_config(options))
        .map_err(|error| JsValue::from_str(&error.to_string()))
}
