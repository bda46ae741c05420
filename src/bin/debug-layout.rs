/// Diagnostic tool to verify tree → layout → polygon pipeline
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use voronoi_treemap::geometry::area;
use voronoi_treemap::tree::{self, WeightedEntry};
use voronoi_treemap::{SolverConfig, VoronoiTreemap};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("voronoi_treemap=debug".parse()?),
        )
        .init();

    let seed: u64 = std::env::args()
        .nth(1)
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or(7);
    let fanout: usize = std::env::args()
        .nth(2)
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or(5);

    println!("=== DIAGNOSTIC: Tree → Voronoi Treemap Pipeline ===");
    println!("Seed: {seed}, fanout: {fanout}");

    // Synthetic three-level hierarchy with skewed weights
    let mut rng = StdRng::seed_from_u64(seed);
    let mut entries = Vec::new();
    for i in 0..fanout {
        for j in 0..fanout {
            let weight = 1.0 + rng.random::<f64>() * 10.0 * (i + 1) as f64;
            entries.push(WeightedEntry::new(format!("group{i}/item{j}"), weight));
        }
    }
    let mut tree = tree::build_tree("root", &entries);
    println!("\n[1] Tree built: {} nodes", tree.len());

    let mut config = SolverConfig::default();
    config.set_size([1000.0, 1000.0])?;
    config.set_max_iteration_count(200);
    let driver = VoronoiTreemap::new(config);

    let summary = driver.layout(&mut tree, &mut rng)?;
    println!(
        "\n[2] Layout computed: {} solves, {} iterations, {} unconverged",
        summary.solves, summary.iterations, summary.unconverged
    );
    println!("    Worst normalized error: {:.4}", summary.max_normalized_error);

    // Per-node area error relative to the share of the parent
    println!("\n[3] Area error per inner node:");
    for id in tree.ids().filter(|&id| tree.has_children(id)) {
        let node = tree.get(id);
        let Some(parent_polygon) = &node.polygon else {
            continue;
        };
        let parent_area = area(parent_polygon);
        let mut error = 0.0;
        let mut covered = 0.0;
        for child_id in tree.children(id) {
            let child = tree.get(child_id);
            let child_area = child.polygon.as_deref().map(area).unwrap_or(0.0);
            let target = parent_area * child.value / node.value;
            error += (target - child_area).abs();
            covered += child_area;
        }
        println!(
            "    '{}' (depth {}) - error {:.2}% , coverage {:.2}%",
            node.name,
            node.depth,
            error * 100.0 / parent_area,
            covered * 100.0 / parent_area
        );
    }

    // Check for anomalies
    println!("\n[4] Checking for anomalies:");
    let missing = tree.ids().filter(|&id| tree.get(id).polygon.is_none()).count();
    println!("    Nodes without polygon: {missing}");

    Ok(())
}
