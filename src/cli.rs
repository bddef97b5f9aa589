use crate::canvas::{Canvas, MemoryCanvas, NodeId};
use crate::commands::{
    ChildRequest, Related, clear_relationship, connect, create_children, init_root, require_pair,
    require_single, select_related, set_child_layout, set_layout,
};
use crate::config::{Config, load_config};
use crate::hierarchy_dump::{HierarchyDump, write_hierarchy_dump};
use crate::ir::{Bounds, Direction, Side};
use crate::layout::SizeMode;
use crate::render::{render_svg, write_output_svg};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{Level, debug};

#[derive(Parser, Debug)]
#[command(name = "gtag", version, about = "Hierarchy tags for flowchart canvases")]
pub struct Args {
    /// Canvas document (JSON)
    #[arg(short = 'd', long = "canvas", default_value = "canvas.json")]
    pub canvas: PathBuf,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// More output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an empty canvas document
    New {
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },
    /// Add a plain (untyped) node to the current page
    AddNode {
        #[arg(long, default_value = "rectangle")]
        kind: String,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        x: f32,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        y: f32,
        #[arg(long, default_value_t = 120.0)]
        width: f32,
        #[arg(long, default_value_t = 60.0)]
        height: f32,
        #[arg(long)]
        text: Option<String>,
    },
    /// Switch the current page
    Page { page: usize },
    /// Make a node a hierarchy root
    InitRoot { node: Option<u64> },
    /// Create children on one side of a node
    AddChildren {
        node: Option<u64>,
        #[arg(short = 's', long, value_enum, default_value = "bottom")]
        side: SideArg,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
        #[arg(long)]
        gap: Option<f32>,
        /// Split the parent's extent between the children
        #[arg(long)]
        fit: bool,
        /// Text for each child, in order
        #[arg(short = 't', long = "text")]
        texts: Vec<String>,
    },
    /// Make CHILD a child of PARENT
    Connect {
        parent: Option<u64>,
        child: Option<u64>,
    },
    /// Select the nodes related to a node
    Select {
        node: Option<u64>,
        #[arg(short = 'r', long, value_enum, default_value = "family")]
        relation: RelationArg,
    },
    /// Set the layout of a node's children (`none` to inherit)
    SetLayout {
        #[arg(value_parser = parse_layout)]
        layout: LayoutArg,
        node: Option<u64>,
    },
    /// Set the layout a parent records for one child (`none` to drop it)
    SetChildLayout {
        #[arg(value_parser = parse_layout)]
        layout: LayoutArg,
        parent: Option<u64>,
        child: Option<u64>,
    },
    /// Remove a node's descriptor
    Clear { node: Option<u64> },
    /// Move descriptors out of the legacy storage slot
    Migrate,
    /// Print the hierarchy of the current page
    Show {
        #[arg(long)]
        json: bool,
        /// Write the JSON dump to a file instead of stdout
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Render the current page
    Render {
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
        #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
        output_format: OutputFormat,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum SideArg {
    Top,
    Right,
    Bottom,
    Left,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Top => Side::Top,
            SideArg::Right => Side::Right,
            SideArg::Bottom => Side::Bottom,
            SideArg::Left => Side::Left,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum RelationArg {
    Siblings,
    Level,
    Ancestors,
    Family,
}

impl From<RelationArg> for Related {
    fn from(relation: RelationArg) -> Self {
        match relation {
            RelationArg::Siblings => Related::Siblings,
            RelationArg::Level => Related::Level,
            RelationArg::Ancestors => Related::Ancestors,
            RelationArg::Family => Related::Family,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutArg(pub Option<Direction>);

fn parse_layout(raw: &str) -> std::result::Result<LayoutArg, String> {
    if raw.eq_ignore_ascii_case("none") {
        return Ok(LayoutArg(None));
    }
    Direction::from_token(&raw.to_ascii_uppercase())
        .map(|direction| LayoutArg(Some(direction)))
        .ok_or_else(|| format!("unknown layout '{raw}' (expected LR, TD, RL, DT or none)"))
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let config = load_config(args.config.as_deref())?;
    execute(&args, &config)
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn execute(args: &Args, config: &Config) -> Result<()> {
    if let Command::New { pages, force } = &args.command {
        if args.canvas.exists() && !force {
            return Err(anyhow::anyhow!(
                "{} already exists (use --force to overwrite)",
                args.canvas.display()
            ));
        }
        let mut canvas = MemoryCanvas::new();
        for _ in 1..*pages {
            canvas.add_page();
        }
        return save_canvas(&args.canvas, &canvas);
    }

    let mut canvas = load_canvas(&args.canvas)?;
    let changed = apply(&mut canvas, &args.command, config)?;
    if changed {
        save_canvas(&args.canvas, &canvas)?;
    }
    Ok(())
}

/// Run one command against a loaded canvas. Returns whether the canvas
/// changed and needs saving.
fn apply(canvas: &mut MemoryCanvas, command: &Command, config: &Config) -> Result<bool> {
    match command {
        Command::New { .. } => Ok(false),
        Command::AddNode {
            kind,
            x,
            y,
            width,
            height,
            text,
        } => {
            let node = canvas.add_node(kind, Bounds::new(*x, *y, *width, *height))?;
            if let Some(text) = text {
                canvas.set_node_text(node, text)?;
            }
            canvas.select(node, false);
            println!("{node}");
            Ok(true)
        }
        Command::Page { page } => {
            canvas.set_current_page(*page)?;
            canvas.selection.clear();
            Ok(true)
        }
        Command::InitRoot { node } => {
            let node = single(canvas, *node)?;
            let descriptor = init_root(canvas, node)?;
            println!("{node} {descriptor}");
            Ok(true)
        }
        Command::AddChildren {
            node,
            side,
            count,
            gap,
            fit,
            texts,
        } => {
            let node = single(canvas, *node)?;
            let mut request = ChildRequest::from_config(&config.placement, (*side).into(), *count)
                .texts(texts.clone());
            if let Some(gap) = gap {
                request = request.gap(*gap);
            }
            if *fit {
                request = request.size_mode(SizeMode::FitParent);
            }
            let report = create_children(canvas, node, &request, &config.edge)?;
            for child in &report.children {
                println!("{} {}", child.node, child.id);
            }
            for skipped in &report.skipped_edges {
                eprintln!("warning: no connection for {skipped}");
            }
            Ok(true)
        }
        Command::Connect { parent, child } => {
            let (parent, child) = match (parent, child) {
                (Some(parent), Some(child)) => (NodeId(*parent), NodeId(*child)),
                (None, None) => require_pair(&canvas.selection)?,
                _ => return Err(anyhow::anyhow!("give both PARENT and CHILD, or neither")),
            };
            let report = connect(canvas, parent, child, &config.edge)?;
            for relabel in &report.relabeled {
                match &relabel.old_id {
                    Some(old) => println!("{} {} -> {}", relabel.node, old, relabel.new_id),
                    None => println!("{} {}", relabel.node, relabel.new_id),
                }
            }
            Ok(true)
        }
        Command::Select { node, relation } => {
            let node = single(canvas, *node)?;
            let selected = select_related(canvas, node, (*relation).into())?;
            let listed: Vec<String> = selected.iter().map(ToString::to_string).collect();
            println!("{}", listed.join(" "));
            Ok(true)
        }
        Command::SetLayout { layout, node } => {
            let node = single(canvas, *node)?;
            let descriptor = set_layout(canvas, node, layout.0)?;
            println!("{node} {descriptor}");
            Ok(true)
        }
        Command::SetChildLayout {
            layout,
            parent,
            child,
        } => {
            let (parent, child) = match (parent, child) {
                (Some(parent), Some(child)) => (NodeId(*parent), NodeId(*child)),
                (None, None) => require_pair(&canvas.selection)?,
                _ => return Err(anyhow::anyhow!("give both PARENT and CHILD, or neither")),
            };
            let descriptor = set_child_layout(canvas, parent, child, layout.0)?;
            println!("{parent} {descriptor}");
            Ok(true)
        }
        Command::Clear { node } => {
            let node = single(canvas, *node)?;
            clear_relationship(canvas, node)?;
            Ok(true)
        }
        Command::Migrate => {
            let migrated = canvas.migrate_legacy_descriptors();
            println!("migrated {migrated} descriptor(s)");
            Ok(migrated > 0)
        }
        Command::Show { json, output } => {
            if let Some(path) = output {
                write_hierarchy_dump(path, canvas)?;
            } else if *json {
                let dump = HierarchyDump::from_canvas(canvas);
                println!("{}", serde_json::to_string_pretty(&dump)?);
            } else {
                print!("{}", outline(&HierarchyDump::from_canvas(canvas)));
            }
            Ok(false)
        }
        Command::Render {
            output,
            output_format,
        } => {
            let svg = render_svg(canvas, &config.theme, &config.render);
            match output_format {
                OutputFormat::Svg => write_output_svg(&svg, output.as_deref())?,
                OutputFormat::Png => {
                    let output = ensure_output(output.as_deref(), "png")?;
                    write_png(&svg, &output, config)?;
                }
            }
            Ok(false)
        }
    }
}

fn single(canvas: &MemoryCanvas, node: Option<u64>) -> Result<NodeId> {
    match node {
        Some(node) => Ok(NodeId(node)),
        None => Ok(require_single(&canvas.selection)?),
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, output, &config.render, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn ensure_output(output: Option<&Path>, ext: &str) -> Result<PathBuf> {
    output
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("Output path required for {} output", ext))
}

fn load_canvas(path: &Path) -> Result<MemoryCanvas> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading canvas {}", path.display()))?;
    let canvas: MemoryCanvas = serde_json::from_str(&contents)
        .with_context(|| format!("parsing canvas {}", path.display()))?;
    debug!(path = %path.display(), pages = canvas.pages.len(), "canvas loaded");
    Ok(canvas)
}

fn save_canvas(path: &Path, canvas: &MemoryCanvas) -> Result<()> {
    let json = serde_json::to_string_pretty(canvas)?;
    std::fs::write(path, json).with_context(|| format!("writing canvas {}", path.display()))?;
    Ok(())
}

fn outline(dump: &HierarchyDump) -> String {
    let mut out = String::new();
    for tree in &dump.roots {
        outline_tree(&mut out, tree, 0);
    }
    if !dump.orphans.is_empty() {
        out.push_str("orphans:\n");
        for tree in &dump.orphans {
            outline_tree(&mut out, tree, 1);
        }
    }
    if !dump.untyped.is_empty() {
        let listed: Vec<String> = dump.untyped.iter().map(ToString::to_string).collect();
        out.push_str(&format!("untyped: {}\n", listed.join(" ")));
    }
    out
}

fn outline_tree(out: &mut String, tree: &crate::hierarchy_dump::TreeDump, depth: usize) {
    out.push_str(&format!(
        "{}{} {} ({}){}\n",
        "  ".repeat(depth),
        tree.id,
        tree.node,
        tree.layout,
        if tree.legacy { " legacy" } else { "" }
    ));
    for missing in &tree.dangling {
        out.push_str(&format!("{}{} (missing)\n", "  ".repeat(depth + 1), missing));
    }
    for child in &tree.children {
        outline_tree(out, child, depth + 1);
    }
}
