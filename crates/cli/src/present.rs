use recipedb_core::config::DESCRIPTION_PREVIEW_CHARS;
use recipedb_core::{RankedResult, Recipe};

const RULE_WIDTH: usize = 60;

/// Shortens `text` to the preview length, marking the cut with `...`.
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(DESCRIPTION_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        head + "..."
    } else {
        head
    }
}

pub fn render_header(query: &str) -> String {
    format!("Query: \"{}\"\n{}", query, "-".repeat(RULE_WIDTH))
}

/// One result block:
///
/// ```text
/// 1. [0.812] Best Brownies
///    ID: 10813
///    Fudgy and rich...
///    Rating: 4.6
/// ```
pub fn render_result(result: &RankedResult<Recipe>) -> String {
    let Some(recipe) = &result.record else {
        return format!(
            "{}. [{:.3}] (no metadata)\n   ID: {}",
            result.rank, result.score, result.id
        );
    };

    let id = recipe.id.clone().unwrap_or_else(|| result.id.to_string());
    let mut lines = vec![
        format!("{}. [{:.3}] {}", result.rank, result.score, recipe.title),
        format!("   ID: {id}"),
    ];
    if let Some(desc) = recipe.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(format!("   {}", preview(desc)));
    }
    if let Some(rating) = recipe.rating.filter(|r| *r != 0.0) {
        lines.push(format!("   Rating: {rating:.1}"));
    }
    lines.join("\n")
}
