use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use voronoi_treemap::geometry::area;
use voronoi_treemap::tree::{self, aggregate, WeightedEntry};
use voronoi_treemap::{NodeId, SolverConfig, VoronoiTreemap, WeightTree};

const USAGE: &str = "usage: voronoi-treemap <weights-file> [--size W H] [--seed N] \
                     [--max-iterations N] [--convergence R] [--sort] [--parallel]";

/// Command-line options.
struct Options {
    input: PathBuf,
    size: [f64; 2],
    seed: Option<u64>,
    max_iterations: Option<usize>,
    convergence: Option<f64>,
    sort: bool,
    parallel: bool,
}

fn parse_args() -> Result<Options> {
    let mut args = std::env::args().skip(1);
    let mut options = Options {
        input: PathBuf::new(),
        size: [960.0, 960.0],
        seed: None,
        max_iterations: None,
        convergence: None,
        sort: false,
        parallel: false,
    };
    let mut input = None;

    while let Some(arg) = args.next() {
        let mut value = |name: &str| args.next().with_context(|| format!("{name} expects a value"));
        match arg.as_str() {
            "--size" => {
                let w = value("--size")?.parse().context("invalid width")?;
                let h = value("--size")?.parse().context("invalid height")?;
                options.size = [w, h];
            }
            "--seed" => options.seed = Some(value("--seed")?.parse().context("invalid seed")?),
            "--max-iterations" => {
                options.max_iterations = Some(value("--max-iterations")?.parse().context("invalid count")?)
            }
            "--convergence" => {
                options.convergence = Some(value("--convergence")?.parse().context("invalid ratio")?)
            }
            "--sort" => options.sort = true,
            "--parallel" => options.parallel = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("unknown option {other}\n{USAGE}"),
            other => input = Some(PathBuf::from(other)),
        }
    }

    options.input = input.with_context(|| USAGE.to_string())?;
    Ok(options)
}

/// One `path weight` pair per line; blank lines and `#` comments are skipped.
fn parse_entries(text: &str) -> Result<Vec<WeightedEntry>> {
    let mut entries = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((path, weight)) = line.rsplit_once(char::is_whitespace) else {
            bail!("line {}: expected `<path> <weight>`", line_no + 1);
        };
        let weight: f64 = weight
            .parse()
            .with_context(|| format!("line {}: invalid weight {weight:?}", line_no + 1))?;
        entries.push(WeightedEntry::new(path.trim(), weight));
    }
    Ok(entries)
}

fn print_node(tree: &WeightTree, id: NodeId, path: &str) {
    let node = tree.get(id);
    let Some(polygon) = &node.polygon else {
        return;
    };
    let vertices: Vec<String> = polygon
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect();
    println!(
        "{}\t{}\t{:.2}\t{}",
        path,
        node.value,
        area(polygon),
        vertices.join(" ")
    );
    for child in tree.children(id) {
        let child_path = format!("{}/{}", path, tree.get(child).name);
        print_node(tree, child, &child_path);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("voronoi_treemap=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = parse_args()?;
    let text = std::fs::read_to_string(&options.input)
        .with_context(|| format!("failed to read {}", options.input.display()))?;
    let entries = parse_entries(&text)?;
    if entries.is_empty() {
        bail!("{} contains no weighted entries", options.input.display());
    }

    let mut tree = tree::build_tree("root", &entries);
    if options.sort {
        aggregate::sort_children_by_value(&mut tree);
    }

    let mut config = SolverConfig::default();
    config.set_size(options.size)?;
    if let Some(count) = options.max_iterations {
        config.set_max_iteration_count(count);
    }
    if let Some(ratio) = options.convergence {
        config.set_convergence_ratio(ratio)?;
    }

    let driver = VoronoiTreemap::new(config);
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let summary = if options.parallel {
        driver.layout_par(&mut tree, &mut rng)
    } else {
        driver.layout(&mut tree, &mut rng)
    }
    .context("treemap layout failed")?;

    tracing::info!(
        "{} solves, worst normalized error {:.4}",
        summary.solves,
        summary.max_normalized_error
    );
    print_node(&tree, tree.root, "root");
    Ok(())
}
