use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use graphtag::canvas::{MemoryCanvas, ScannedNode, scan_page};
use graphtag::hierarchy::{child_level, generate_sibling_ids};
use graphtag::ir::Bounds;
use graphtag::parser::parse_descriptor;
use graphtag::query::{family, siblings};
use std::hint::black_box;

/// Descriptor texts for a full tree with `fanout` children per node,
/// `depth` levels below the root.
fn tree_descriptors(fanout: usize, depth: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut frontier = vec![(Vec::<String>::new(), "A1".to_string())];
    for level in 0..=depth {
        let mut next = Vec::new();
        for (chain, id) in frontier {
            let children = if level < depth {
                generate_sibling_ids(&child_level(&id), 1, fanout).unwrap_or_default()
            } else {
                Vec::new()
            };
            out.push(format!(
                "graph[{}](TD)[{}][{}]",
                chain.join("|"),
                id,
                children.join(",")
            ));
            let mut child_chain = chain.clone();
            child_chain.push(id);
            for child in children {
                next.push((child_chain.clone(), child));
            }
        }
        frontier = next;
    }
    out
}

fn canvas_with(texts: &[String]) -> MemoryCanvas {
    let mut canvas = MemoryCanvas::new();
    for text in texts {
        let node = canvas
            .add_node("rectangle", Bounds::new(0.0, 0.0, 100.0, 50.0))
            .expect("add node");
        canvas.node_mut(node).expect("node").descriptor = Some(text.clone());
    }
    canvas
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_descriptor");
    for (fanout, depth) in [(4usize, 3usize), (6, 4)] {
        let texts = tree_descriptors(fanout, depth);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("tree_{}x{}", fanout, depth)),
            &texts,
            |b, texts| {
                b.iter(|| {
                    let parsed = texts
                        .iter()
                        .filter_map(|text| parse_descriptor(black_box(text)))
                        .count();
                    black_box(parsed);
                });
            },
        );
    }
    group.finish();
}

fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");
    for (fanout, depth) in [(4usize, 3usize), (6, 4)] {
        let canvas = canvas_with(&tree_descriptors(fanout, depth));
        let nodes: Vec<ScannedNode> = scan_page(&canvas);
        let root = nodes[0].clone();
        let leaf = nodes[nodes.len() - 1].clone();
        let name = format!("tree_{}x{}", fanout, depth);
        group.bench_with_input(BenchmarkId::new("family", &name), &nodes, |b, nodes| {
            b.iter(|| black_box(family(nodes, black_box(&root)).len()));
        });
        group.bench_with_input(BenchmarkId::new("siblings", &name), &nodes, |b, nodes| {
            b.iter(|| black_box(siblings(nodes, black_box(&leaf)).len()));
        });
        group.bench_function(BenchmarkId::new("scan_page", &name), |b| {
            b.iter(|| black_box(scan_page(black_box(&canvas)).len()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_traversal);
criterion_main!(benches);
