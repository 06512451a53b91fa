use crate::config::{Config, FlowDiagramStyle, load_config};
use crate::ir::FlowGraph;
use crate::layout::{DagreEngine, Diagram, LayoutEngine, ReplayEngine, layout_flow};
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_flow;
#[cfg(feature = "png")]
use crate::render::write_output_png;
use crate::render::{render_svg, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "boxline", version, about = "Box-line renderer for production flow graphs")]
pub struct Args {
    /// Input flow JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Viewport width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Viewport height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Box-line variant
    #[arg(short = 's', long = "style", value_enum)]
    pub style: Option<FlowDiagramStyle>,

    /// Recorded layout engine output (ELK JSON) to use instead of dagre
    #[arg(long = "layoutFile")]
    pub layout_file: Option<PathBuf>,

    /// Write the computed geometry as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long = "logLevel", default_value = "warn")]
    pub log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run(args: &Args) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    let input = read_input(args.input.as_deref())?;
    let parsed = parse_flow(&input)?;
    if let Some(init_cfg) = parsed.init_config {
        config = merge_init_config(config, init_cfg);
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if let Some(style) = args.style {
        config.layout.style = style.into();
    }
    log::info!(
        nodes = parsed.graph.nodes.len(),
        links = parsed.graph.links.len();
        "Parsed flow"
    );

    let diagram = match args.layout_file.as_deref() {
        Some(path) => {
            log::info!(path = path.display().to_string(); "Replaying recorded layout");
            lay_out(&parsed.graph, &ReplayEngine::from_path(path)?, &config)?
        }
        None => lay_out(&parsed.graph, &DagreEngine::new(), &config)?,
    };

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &diagram)?;
    }

    let svg = render_svg(&diagram, &parsed.graph, &config.theme, &config.render);
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&svg, &output, &config)?;
        }
    }
    Ok(())
}

fn lay_out<E: LayoutEngine>(
    graph: &FlowGraph,
    engine: &E,
    config: &Config,
) -> Result<Diagram> {
    let viewport = (config.render.width, config.render.height);
    let diagram = futures::executor::block_on(layout_flow(graph, engine, &config.layout, viewport))?;
    Ok(diagram)
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    write_output_png(svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!(
        "Output path required for {} output",
        ext
    ))
}

/// Applies the `config` object embedded in a flow document.
fn merge_init_config(mut config: Config, init: serde_json::Value) -> Config {
    if let Some(style) = init.get("style").and_then(|v| v.as_str()) {
        match serde_json::from_value::<FlowDiagramStyle>(serde_json::Value::from(style)) {
            Ok(style) => config.layout.style = style.into(),
            Err(_) => log::warn!(style; "Unknown diagram style in flow config"),
        }
    }
    if let Some(theme_vars) = init.get("themeVariables") {
        let text = |key: &str| theme_vars.get(key).and_then(|v| v.as_str()).map(str::to_string);
        if let Some(val) = text("fontFamily") {
            config.theme.font_family = val;
        }
        if let Some(val) = theme_vars.get("fontSize").and_then(|v| v.as_f64()) {
            config.theme.font_size = val as f32;
        }
        if let Some(val) = text("textColor") {
            config.theme.text_color = val;
        }
        if let Some(val) = text("lightTextColor") {
            config.theme.light_text_color = val;
        }
        if let Some(val) = text("edgeOutlineColor") {
            config.theme.edge_outline_color = val;
        }
        if let Some(val) = text("background") {
            config.render.background = val.clone();
            config.theme.background = val;
        }
    }
    if let Some(options) = init.get("layoutOptions").and_then(|v| v.as_object()) {
        for (key, value) in options {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            config.layout.layout_options.insert(key.clone(), value);
        }
    }
    config
}
