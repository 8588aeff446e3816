use std::io::{Read, Write};

use tracing::{debug, info};

use remarx_lib::ann::forest::ForestBuilder;
use remarx_lib::config::{HASH_MODEL_NAME, MatchParams};
use remarx_lib::embedding::cache::{EmbeddingCache, NoCache, SqliteCache};
use remarx_lib::embedding::embedder::Embedder;
use remarx_lib::embedding::encoder::{HashEncoder, SentenceEncoder};
use remarx_lib::db::queries::count_embeddings;
use remarx_lib::embedding::provider::EmbeddingProvider;
use remarx_lib::error::RemarxError;
use remarx_lib::output::ConsoleIO;
use remarx_lib::quotation::find_quotes::{FindQuotesRequest, QuoteReport, run_find_quotes};
use remarx_lib::runtime::Runtime;

use crate::cli::FindQuotesArgs;
use crate::logging::init_logging;

/// Run the `remarx find-quotes` command.
pub fn run_find_quotes_cmd<IN, OUT, ERR>(
    args: &FindQuotesArgs,
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: Read,
    OUT: Write,
    ERR: Write,
{
    init_logging(args.verbose, args.log_file.as_deref())?;

    let paths = args.corpus_paths()?;
    let original_inputs = if let Some(original) = paths.original {
        vec![original]
    } else {
        let default_dir = runtime.context.default_original_dir().to_path_buf();
        info!(path = %default_dir.display(), "No original corpora given; using default directory");
        vec![default_dir]
    };

    let request = FindQuotesRequest {
        original_inputs,
        reuse_corpus: paths.reuse,
        output: paths.output,
        params: MatchParams {
            score_cutoff: args.cutoff,
            n_trees: args.n_trees,
            search_k: args.search_k(),
            random_seed: args.seed,
        },
        consolidate: !args.no_consolidate,
    };
    request.prepare()?;

    let encoder = load_encoder(&args.model, runtime)?;
    let cache = open_cache(args.no_cache, runtime)?;
    let mut provider = EmbeddingProvider::new(encoder, cache);

    let report = run_find_quotes(&request, &mut provider, &ForestBuilder::default())?;
    if args.benchmark {
        log_benchmark(&report);
    }

    writeln!(
        io.stdout(),
        "Found {} quote pairs; saved to {}",
        report.quote_pairs,
        report.output.display()
    )?;
    if request.consolidate && report.rows_written != report.quote_pairs {
        writeln!(
            io.stdout(),
            "Consolidated into {} passages",
            report.rows_written
        )?;
    }
    Ok(())
}

fn load_encoder(model: &str, runtime: &Runtime) -> anyhow::Result<Box<dyn SentenceEncoder>> {
    if model == HASH_MODEL_NAME {
        return Ok(Box::new(HashEncoder::default()));
    }
    let embedder =
        Embedder::new(runtime.context.model_cache_dir(), model).map_err(RemarxError::Model)?;
    Ok(Box::new(embedder))
}

fn open_cache(disabled: bool, runtime: &Runtime) -> anyhow::Result<Box<dyn EmbeddingCache>> {
    if disabled {
        return Ok(Box::new(NoCache));
    }
    let conn = runtime.cache_db.open().map_err(RemarxError::Cache)?;
    debug!(
        entries = count_embeddings(&conn).map_err(RemarxError::Cache)?,
        "Opened embedding cache"
    );
    Ok(Box::new(SqliteCache::new(conn)))
}

fn log_benchmark(report: &QuoteReport) {
    let timings = report.timings;
    info!(
        original_sentences = report.original_sentences,
        reuse_sentences = report.reuse_sentences,
        embedding_seconds = timings.embedding.as_secs_f64(),
        index_seconds = timings.index.as_secs_f64(),
        matching_seconds = timings.matching.as_secs_f64(),
        total_seconds = timings.total().as_secs_f64(),
        "Benchmark"
    );
}
