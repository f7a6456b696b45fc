use anyhow::Result;
use clap::Parser;
use kgraph::db::{migrate, Db};
use kgraph::error::KgraphError;
use kgraph::store;
use kgraph::Config;
use std::collections::HashMap;

#[derive(Parser, Debug)]
#[command(name = "seed")]
#[command(about = "Seed the kgraph database with a demo concept graph (idempotent)")]
struct Args {
    /// Delete all existing concepts and relationships before seeding
    #[arg(long)]
    reset: bool,
}

const CONCEPTS: &[(&str, &str)] = &[
    ("Machine Learning", "concept"),
    ("Neural Networks", "concept"),
    ("Deep Learning", "concept"),
    ("Backpropagation", "algorithm"),
    ("Gradient Descent", "algorithm"),
    ("Transformer", "architecture"),
    ("Attention Mechanism", "concept"),
    ("Natural Language Processing", "field"),
    ("Computer Vision", "field"),
    ("Convolutional Neural Network", "architecture"),
];

const EDGES: &[(&str, &str, &str, &str)] = &[
    (
        "Machine Learning",
        "includes",
        "Neural Networks",
        "Neural networks are a subset of machine learning",
    ),
    (
        "Machine Learning",
        "includes",
        "Deep Learning",
        "Deep learning is a branch of machine learning",
    ),
    (
        "Machine Learning",
        "uses",
        "Gradient Descent",
        "Machine learning algorithms use gradient descent",
    ),
    (
        "Neural Networks",
        "is_type_of",
        "Deep Learning",
        "Neural networks are the foundation of deep learning",
    ),
    (
        "Neural Networks",
        "uses",
        "Backpropagation",
        "Neural networks train using backpropagation",
    ),
    (
        "Neural Networks",
        "uses",
        "Gradient Descent",
        "Neural networks optimize with gradient descent",
    ),
    (
        "Deep Learning",
        "includes",
        "Transformer",
        "Transformers are a deep learning architecture",
    ),
    (
        "Deep Learning",
        "includes",
        "Convolutional Neural Network",
        "CNNs are a type of deep learning model",
    ),
    (
        "Deep Learning",
        "applies_to",
        "Natural Language Processing",
        "Deep learning is used in NLP",
    ),
    (
        "Deep Learning",
        "applies_to",
        "Computer Vision",
        "Deep learning is used in computer vision",
    ),
    (
        "Transformer",
        "uses",
        "Attention Mechanism",
        "Transformers rely on attention mechanisms",
    ),
    (
        "Transformer",
        "applies_to",
        "Natural Language Processing",
        "Transformers revolutionized NLP",
    ),
    (
        "Attention Mechanism",
        "enables",
        "Transformer",
        "Attention allows transformers to process sequences",
    ),
    (
        "Backpropagation",
        "uses",
        "Gradient Descent",
        "Backpropagation computes gradients for gradient descent",
    ),
    (
        "Convolutional Neural Network",
        "applies_to",
        "Computer Vision",
        "CNNs are primarily used in computer vision",
    ),
    (
        "Convolutional Neural Network",
        "is_type_of",
        "Neural Networks",
        "CNNs are a type of neural network",
    ),
    (
        "Natural Language Processing",
        "uses",
        "Transformer",
        "NLP heavily uses transformer models",
    ),
];

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", "info"),
    )
    .init();

    let args = Args::parse();

    let config = Config::load()?;
    log::info!("Database path: {}", config.db_path().display());

    if let Some(parent) = config.db_path().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Db::new(config.db_path());
    db.with_connection(migrate::run_migrations).await?;

    if args.reset {
        log::info!("Resetting existing graph data");
        db.with_connection(|conn| {
            conn.execute("DELETE FROM relationships", [])?;
            conn.execute("DELETE FROM concepts", [])?;
            Ok::<(), KgraphError>(())
        })
        .await?;
    }

    // Resolve-before-create keeps names unique even when re-run
    let mut ids: HashMap<&str, i64> = HashMap::new();
    let mut new_concepts = 0;
    for &(name, kind) in CONCEPTS {
        let concept = match store::get_concept_by_name(&db, name).await? {
            Some(existing) => existing,
            None => {
                new_concepts += 1;
                store::create_concept(&db, name, Some(kind), None).await?
            }
        };
        ids.insert(name, concept.id);
    }
    log::info!("✓ Created {} concept(s)", new_concepts);

    // The demo graph intentionally contains reciprocal edges (e.g. Transformer
    // uses Attention, Attention enables Transformer), so idempotency here is
    // on the exact (src, relation, dst) triple rather than the unordered pair.
    let existing: std::collections::HashSet<(i64, String, i64)> =
        store::list_relationships(&db)
            .await?
            .into_iter()
            .map(|e| (e.src_id, e.relation, e.dst_id))
            .collect();

    let mut new_edges = 0;
    for &(src, relation, dst, evidence) in EDGES {
        let src_id = ids[src];
        let dst_id = ids[dst];
        if existing.contains(&(src_id, relation.to_string(), dst_id)) {
            continue;
        }
        store::create_relationship(&db, src_id, relation, dst_id, Some(evidence)).await?;
        new_edges += 1;
    }
    log::info!("✓ Created {} relationship(s)", new_edges);

    let graph = kgraph::get_full_graph(&db).await?;
    log::info!(
        "Database summary: {} concept(s), {} relationship(s)",
        graph.concepts.len(),
        graph.relationships.len()
    );

    for edge in graph.relationships.iter().take(5) {
        log::info!(
            "  \"{}\" --[{}]--> \"{}\"",
            edge.src_name,
            edge.relation,
            edge.dst_name
        );
    }

    Ok(())
}
