//! Joins parsed query fragments into a single `tsquery` expression.

use super::types::{CompiledQuery, ParsedQuery};

const AND: &str = " & ";

/// AND-joins the ID fragments, then the word fragments, then both groups.
///
/// ```
/// use tracker_api::domain::search::{assemble, ParsedQuery};
///
/// let parsed = ParsedQuery {
///     id_fragments: vec!["1:*A".to_string()],
///     word_fragments: vec!["a:*".to_string()],
///     ..Default::default()
/// };
/// assert_eq!(assemble(&parsed).as_str(), "1:*A & a:*");
/// ```
pub fn assemble(query: &ParsedQuery) -> CompiledQuery {
    let ids = query.id_fragments.join(AND);
    let words = query.word_fragments.join(AND);

    if !ids.is_empty() && !words.is_empty() {
        CompiledQuery::new(format!("{ids}{AND}{words}"))
    } else {
        // at most one side has content
        CompiledQuery::new(ids + &words)
    }
}
