use clap::{Parser, Subcommand};
use recipedb_cli::embedder::HttpEmbedder;
use recipedb_cli::{corpus, index, present, repl};
use recipedb_core::config;
use recipedb_core::{
    DistanceMetric, EmbedError, Embedder, EmbeddingStore, HnswConfig, HnswIndex, IndexHandle,
    MetadataSource, QueryPipeline, RecipeCatalog,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recipe-search", about = "Semantic recipe search over an HNSW index")]
struct Args {
    /// Embedding file (little-endian i32 count, i32 dimension, f32 rows)
    #[arg(long, env = "RECIPEDB_EMBEDDINGS", default_value = config::DEFAULT_EMBEDDINGS_PATH)]
    embeddings: PathBuf,

    /// Graph artifact path
    #[arg(long, env = "RECIPEDB_INDEX", default_value = config::DEFAULT_INDEX_PATH)]
    index: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Embed every recipe through the endpoint and write the embedding file
    Embed {
        /// Recipe JSON dump; embedding ids follow its order
        #[arg(long, env = "RECIPEDB_RECIPES", default_value = config::DEFAULT_RECIPES_PATH)]
        recipes: PathBuf,

        /// Embedding endpoint receiving `{"input": text}`
        #[arg(long, env = "RECIPEDB_EMBED_URL")]
        embed_url: String,
    },
    /// Build the graph over the embedding file and save it
    Build {
        /// Links per node on upper layers (layer 0 uses 2 * M)
        #[arg(short, long, default_value_t = config::HNSW_DEFAULT_M)]
        m: usize,

        /// Candidate list size during construction
        #[arg(long, default_value_t = config::HNSW_DEFAULT_EF_CONSTRUCTION)]
        ef_construction: usize,

        /// Distance metric: cosine, euclidean, or dot
        #[arg(long, default_value = "cosine")]
        metric: DistanceMetric,

        /// Seed for layer assignment
        #[arg(long, default_value_t = config::HNSW_DEFAULT_SEED)]
        seed: u64,

        /// Rebuild even if an artifact already exists
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Query the index interactively, or list neighbors of a stored recipe
    Search {
        /// Recipe JSON dump whose order matches the embedding file
        #[arg(long, env = "RECIPEDB_RECIPES", default_value = config::DEFAULT_RECIPES_PATH)]
        recipes: PathBuf,

        /// Embedding endpoint receiving `{"input": text}`
        #[arg(long, env = "RECIPEDB_EMBED_URL")]
        embed_url: Option<String>,

        /// Number of results per query
        #[arg(short, default_value_t = config::DEFAULT_K)]
        k: usize,

        /// Search candidate list size (defaults to the index's ef_search)
        #[arg(long)]
        ef: Option<usize>,

        /// Show recipes similar to this embedding id instead of reading queries
        #[arg(long)]
        id: Option<u32>,
    },
    /// Print structural statistics of the graph
    Stats,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("recipedb_core=info".parse()?)
                .add_directive("recipedb_cli=info".parse()?),
        )
        .init();

    let args = Args::parse();

    if let Command::Embed { recipes, embed_url } = &args.command {
        let catalog = RecipeCatalog::load(recipes)?;
        let embedder = HttpEmbedder::new(embed_url.as_str())?;
        tracing::info!("Using embedding endpoint {}", embedder.url());
        let started = Instant::now();
        let store = corpus::write_embeddings(&catalog, &embedder, &args.embeddings)?;
        tracing::info!(
            "Embedded {} recipes (dim {}) in {:.1}s",
            store.len(),
            store.dimension(),
            started.elapsed().as_secs_f64()
        );
        return Ok(());
    }

    if !args.embeddings.is_file() {
        eprintln!(
            "Error: embedding file '{}' not found",
            args.embeddings.display()
        );
        std::process::exit(1);
    }
    let store = Arc::new(EmbeddingStore::load(&args.embeddings)?);

    match args.command {
        Command::Embed { .. } => {}
        Command::Build {
            m,
            ef_construction,
            metric,
            seed,
            force,
        } => {
            let config = HnswConfig {
                ef_construction,
                distance_metric: metric,
                seed,
                ..HnswConfig::with_m(m)
            };
            let started = Instant::now();
            let index = if force {
                index::rebuild(store, &args.index, config)?
            } else {
                index::load_or_build(store, &args.index, config)?
            };
            tracing::info!(
                "Index ready: {} nodes in {:.1}s",
                index.len(),
                started.elapsed().as_secs_f64()
            );
            println!("{}", index.stats());
        }
        Command::Search {
            recipes,
            embed_url,
            k,
            ef,
            id,
        } => {
            if k == 0 {
                eprintln!("Error: k must be > 0");
                std::process::exit(1);
            }
            let index = index::load_or_build(store, &args.index, HnswConfig::default())?;
            let catalog = RecipeCatalog::load(&recipes)?;
            if catalog.len() != index.len() {
                tracing::warn!(
                    "Recipe count {} differs from index size {}",
                    catalog.len(),
                    index.len()
                );
            }

            match (id, embed_url) {
                (Some(id), _) => {
                    let no_text = |_: &str| -> Result<Vec<f32>, EmbedError> {
                        Err("text queries need --embed-url".into())
                    };
                    let pipeline =
                        with_ef(QueryPipeline::new(IndexHandle::new(index), no_text, catalog), ef);
                    for result in pipeline.more_like(id, k)? {
                        println!("\n{}", present::render_result(&result));
                    }
                }
                (None, Some(url)) => {
                    let embedder = HttpEmbedder::new(url)?;
                    tracing::info!("Using embedding endpoint {}", embedder.url());
                    let pipeline =
                        with_ef(QueryPipeline::new(IndexHandle::new(index), embedder, catalog), ef);
                    println!("Recipe Semantic Search");
                    println!("Type a query to search, or 'quit' to exit");
                    let stdin = io::stdin();
                    repl::run(&pipeline, k, stdin.lock(), &mut io::stdout())?;
                }
                (None, None) => {
                    eprintln!(
                        "Error: --embed-url (or RECIPEDB_EMBED_URL) is required for text queries"
                    );
                    std::process::exit(1);
                }
            }
        }
        Command::Stats => {
            let index = HnswIndex::load(&args.index, store)?;
            println!("{}", index.stats());
        }
    }
    Ok(())
}

fn with_ef<E, M>(pipeline: QueryPipeline<E, M>, ef: Option<usize>) -> QueryPipeline<E, M>
where
    E: Embedder,
    M: MetadataSource,
{
    match ef {
        Some(ef) => pipeline.with_ef(ef),
        None => pipeline,
    }
}
