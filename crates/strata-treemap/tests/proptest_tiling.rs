//! Property tests for the squarified layout.
//!
//! 1. Rectangle areas add up to the container area.
//! 2. No two rectangles overlap.
//! 3. Every rectangle lies inside the container.
//! 4. Each rectangle's area is proportional to its weight.

use proptest::prelude::*;
use strata_treemap::squarify::{squarify, squarify_tree, Rect, TreemapRect, WeightedNode};
use strata_treemap::tree::WeightedTree;

fn nodes_strategy() -> impl Strategy<Value = Vec<WeightedNode>> {
    prop::collection::vec(0.1f64..1000.0, 1..40).prop_map(|weights| {
        weights
            .into_iter()
            .enumerate()
            .map(|(i, w)| WeightedNode::new(format!("n{i}"), w))
            .collect()
    })
}

fn bounds_strategy() -> impl Strategy<Value = Rect> {
    (-500.0f64..500.0, -500.0f64..500.0, 1.0f64..1000.0, 1.0f64..1000.0)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn overlap(a: &TreemapRect, b: &TreemapRect) -> f64 {
    let w = (a.x + a.width).min(b.x + b.width) - a.x.max(b.x);
    let h = (a.y + a.height).min(b.y + b.height) - a.y.max(b.y);
    w.max(0.0) * h.max(0.0)
}

proptest! {
    #[test]
    fn areas_sum_to_container(nodes in nodes_strategy(), bounds in bounds_strategy()) {
        let total: f64 = nodes.iter().map(|n| n.weight).sum();
        let rects = squarify(&nodes, bounds, total);
        prop_assert_eq!(rects.len(), nodes.len());

        let sum: f64 = rects.iter().map(TreemapRect::area).sum();
        prop_assert!(
            (sum - bounds.area()).abs() <= 1e-6 * bounds.area(),
            "sum {} vs container {}", sum, bounds.area()
        );
    }

    #[test]
    fn rectangles_do_not_overlap(nodes in nodes_strategy(), bounds in bounds_strategy()) {
        let total: f64 = nodes.iter().map(|n| n.weight).sum();
        let rects = squarify(&nodes, bounds, total);
        let eps = 1e-6 * bounds.area();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                prop_assert!(overlap(a, b) <= eps, "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn rectangles_stay_inside(nodes in nodes_strategy(), bounds in bounds_strategy()) {
        let total: f64 = nodes.iter().map(|n| n.weight).sum();
        let eps = 1e-6 * bounds.width.max(bounds.height);
        for r in squarify(&nodes, bounds, total) {
            prop_assert!(r.width >= -eps && r.height >= -eps);
            prop_assert!(r.x >= bounds.x - eps && r.y >= bounds.y - eps);
            prop_assert!(r.x + r.width <= bounds.x + bounds.width + eps);
            prop_assert!(r.y + r.height <= bounds.y + bounds.height + eps);
        }
    }

    #[test]
    fn area_is_proportional_to_weight(nodes in nodes_strategy(), bounds in bounds_strategy()) {
        let total: f64 = nodes.iter().map(|n| n.weight).sum();
        let scale = bounds.area() / total;
        for r in squarify(&nodes, bounds, total) {
            let weight = nodes.iter().find(|n| n.id == r.node_id).map(|n| n.weight);
            prop_assert!(weight.is_some());
            let expected = weight.unwrap_or_default() * scale;
            prop_assert!((r.area() - expected).abs() <= 1e-6 * bounds.area());
        }
    }

    #[test]
    fn nested_levels_tile_their_parent(weights in prop::collection::vec(1.0f64..100.0, 1..30)) {
        let paths = weights
            .iter()
            .enumerate()
            .map(|(i, w)| (format!("d{}/f{i}.rs", i % 4), *w));
        let tree = WeightedTree::from_paths("root", paths);
        let bounds = Rect::new(0.0, 0.0, 120.0, 40.0);
        let rects = squarify_tree(&tree, bounds, 2);

        for parent in rects.iter().filter(|r| r.depth == 0) {
            let prefix = format!("{}/", parent.node_id);
            let children: f64 = rects
                .iter()
                .filter(|r| r.depth == 1 && r.node_id.starts_with(&prefix))
                .map(TreemapRect::area)
                .sum();
            prop_assert!((children - parent.area()).abs() <= 1e-6 * bounds.area());
        }
    }
}
