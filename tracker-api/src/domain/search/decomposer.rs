//! Turns URLs into `tsquery` fragments.

use super::known_url::{KnownUrl, KnownUrlRegistry};

/// Lexeme suffix meaning "this lexeme or any lexeme it prefixes".
pub const PREFIX_MATCH: &str = ":*";

/// Capture group whose value is indexed on its own.
const ID_GROUP: &str = "id";

/// Builds the query fragment for `url` from the known URL registered as
/// `name`. Returns `None` if no such pattern exists or it does not match.
pub fn decompose(registry: &KnownUrlRegistry, name: &str, url: &str) -> Option<String> {
    let known = registry.get(name)?;
    decompose_with(&known, url)
}

/// Builds the query fragment for `url` from `known`.
///
/// All capture groups after the whole match are concatenated (groups that
/// did not participate count as empty) into one prefix lexeme. If an `id`
/// group matched, the fragment becomes an OR of the bare ID and the
/// composite, since resource links are indexed under both.
pub fn decompose_with(known: &KnownUrl, url: &str) -> Option<String> {
    let captures = known.regex().captures(url)?;
    if captures.len() == 1 {
        return Some(format!("{}{PREFIX_MATCH}", &captures[0]));
    }

    let composite: String = captures
        .iter()
        .skip(1)
        .map(|group| group.map_or("", |m| m.as_str()))
        .collect();
    let fragment = format!("{}{PREFIX_MATCH}", composite.replace(':', "\\:"));

    match captures.name(ID_GROUP).map(|m| m.as_str()) {
        Some(id) if !id.is_empty() => Some(format!("({id}{PREFIX_MATCH} | {fragment})")),
        _ => Some(fragment),
    }
}

/// Strips one leading `http://` or `https://`.
pub fn trim_protocol(url: &str) -> &str {
    url.strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .unwrap_or(url)
}

/// Backslash-escapes the characters `tsquery` reserves (`:`, `(`, `)`).
pub fn escape_lexeme(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, ':' | '(' | ')') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Cleans a URL no known pattern matches: strips the protocol and escapes
/// reserved characters.
pub fn sanitize_generic_url(url: &str) -> String {
    escape_lexeme(trim_protocol(url))
}

/// Query fragment for a protocol-less, lowercased URL token.
pub fn url_to_query_fragment(registry: &KnownUrlRegistry, url: &str) -> String {
    registry
        .best_match(url)
        .and_then(|found| decompose(registry, &found.name, url))
        .unwrap_or_else(|| format!("{}{PREFIX_MATCH}", sanitize_generic_url(url)))
}
