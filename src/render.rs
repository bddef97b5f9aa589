use crate::canvas::{CanvasEdge, CanvasNode, LineStyle, MemoryCanvas, Page};
use crate::config::RenderConfig;
use crate::parser::parse_descriptor;
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// Draw the current page: nodes with their text and hierarchy ID, then the
/// edges on top.
pub fn render_svg(canvas: &MemoryCanvas, theme: &Theme, config: &RenderConfig) -> String {
    let empty = Page::default();
    let page = canvas.page().unwrap_or(&empty);
    let (min_x, min_y, max_x, max_y) = extent(page);
    let pad = config.padding;
    let width = (max_x - min_x + pad * 2.0).max(200.0);
    let height = (max_y - min_y + pad * 2.0).max(200.0);
    let shift_x = pad - min_x;
    let shift_y = pad - min_y;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));
    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.node_stroke
    ));
    svg.push_str("</defs>");
    svg.push_str(&format!("<g transform=\"translate({shift_x:.2} {shift_y:.2})\">"));

    for node in &page.nodes {
        svg.push_str(&node_svg(node, theme));
    }
    for edge in &page.edges {
        svg.push_str(&edge_svg(edge));
    }

    svg.push_str("</g></svg>");
    svg
}

fn extent(page: &Page) -> (f32, f32, f32, f32) {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for node in &page.nodes {
        min_x = min_x.min(node.bounds.x);
        min_y = min_y.min(node.bounds.y);
        max_x = max_x.max(node.bounds.right());
        max_y = max_y.max(node.bounds.bottom());
    }
    for edge in &page.edges {
        for point in [edge.start, edge.end] {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
    }
    if min_x > max_x {
        return (0.0, 0.0, 0.0, 0.0);
    }
    (min_x, min_y, max_x, max_y)
}

fn node_svg(node: &CanvasNode, theme: &Theme) -> String {
    let b = node.bounds;
    let descriptor = node.descriptor.as_deref().and_then(parse_descriptor);
    let fill = if descriptor.is_some() {
        &theme.node_fill
    } else {
        &theme.untyped_fill
    };
    let mut out = match node.kind.as_str() {
        "ellipse" | "oval" => format!(
            "<ellipse cx=\"{:.2}\" cy=\"{:.2}\" rx=\"{:.2}\" ry=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
            b.x + b.width / 2.0,
            b.y + b.height / 2.0,
            b.width / 2.0,
            b.height / 2.0,
            fill,
            theme.node_stroke
        ),
        _ => format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"6\" ry=\"6\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
            b.x, b.y, b.width, b.height, fill, theme.node_stroke
        ),
    };

    if let Some(text) = node.text.as_deref().filter(|text| !text.is_empty()) {
        let center = b.center();
        out.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            center.x,
            center.y,
            escape_xml(&theme.font_family),
            theme.font_size,
            theme.node_text_color,
            escape_xml(text)
        ));
    }
    if let Some(descriptor) = descriptor {
        out.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{:.1}\" fill=\"{}\">{}</text>",
            b.x + 4.0,
            b.y + theme.font_size * 0.75 + 2.0,
            escape_xml(&theme.font_family),
            theme.font_size * 0.75,
            theme.id_text_color,
            escape_xml(&descriptor.current)
        ));
    }
    out
}

fn edge_svg(edge: &CanvasEdge) -> String {
    let style = &edge.style;
    let dash = match style.line {
        LineStyle::Solid => "",
        LineStyle::Dashed => " stroke-dasharray=\"6 4\"",
        LineStyle::Dotted => " stroke-dasharray=\"2 3\"",
    };
    let start = if style.arrow_start { " marker-start=\"url(#arrow)\"" } else { "" };
    let end = if style.arrow_end { " marker-end=\"url(#arrow)\"" } else { "" };
    format!(
        "<path d=\"M {:.2} {:.2} L {:.2} {:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"{}{}{} />",
        edge.start.x,
        edge.start.y,
        edge.end.x,
        edge.end.y,
        escape_xml(&style.color),
        style.width,
        dash,
        start,
        end
    )
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|family| family.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| "Inter".to_string());
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("invalid render size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
