use crate::present::{render_header, render_result};
use recipedb_core::config::EXIT_COMMANDS;
use recipedb_core::{Embedder, MetadataSource, QueryPipeline, Recipe};
use std::io::{self, BufRead, Write};

/// Reads queries line by line from `input` and writes ranked recipes to `out`.
///
/// Stops at end of input or on an exit word. A failed query is reported and
/// the loop continues. Returns the number of queries answered.
pub fn run<E, M, R, W>(
    pipeline: &QueryPipeline<E, M>,
    k: usize,
    mut input: R,
    out: &mut W,
) -> io::Result<usize>
where
    E: Embedder,
    M: MetadataSource<Record = Recipe>,
    R: BufRead,
    W: Write,
{
    let mut answered = 0;
    let mut line = String::new();
    loop {
        write!(out, "\n> ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if EXIT_COMMANDS.contains(&query.to_lowercase().as_str()) {
            break;
        }
        if query.is_empty() {
            continue;
        }

        match pipeline.query_by_text(query, k) {
            Ok(results) => {
                writeln!(out, "\n{}", render_header(query))?;
                if results.is_empty() {
                    writeln!(out, "\nNo results.")?;
                }
                for result in &results {
                    writeln!(out, "\n{}", render_result(result))?;
                }
                answered += 1;
            }
            Err(e) => {
                tracing::warn!("Query failed: {}", e);
                writeln!(out, "Error: {e}")?;
            }
        }
    }
    writeln!(out, "\nGoodbye!")?;
    Ok(answered)
}
