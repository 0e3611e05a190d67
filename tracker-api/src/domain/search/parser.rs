//! Query tokenizer turning a raw search string into typed search tokens.
//!
//! Supported token forms:
//!
//! - `id:<value>` → lexeme fragment matched against work item IDs
//! - `type:<uuid>` → restricts results to that type and its subtypes
//! - a URL → decomposed via the [`KnownUrlRegistry`] or sanitized
//! - anything else → lowercased prefix lexeme

use std::borrow::Cow;

use tracing::warn;
use url::{Host, Url};
use uuid::Uuid;

use super::decomposer::{sanitize_generic_url, trim_protocol, url_to_query_fragment, PREFIX_MATCH};
use super::known_url::KnownUrlRegistry;
use super::traits::{Result, SearchError};
use super::types::{ParsedQuery, SearchToken};

const ID_PREFIX: &str = "id:";
const TYPE_PREFIX: &str = "type:";

/// Suffix of ID lexemes. Kept as is for compatibility with existing indexes.
const ID_LEXEME_SUFFIX: &str = ":*A";

/// Longest string still accepted as a URL.
const MAX_URL_LENGTH: usize = 2083;

/// Split a raw search string into a [`ParsedQuery`].
///
/// Fails with [`SearchError::BadParameter`] on an empty or malformed
/// `type:` value. Tokens that cannot be percent-decoded are used verbatim.
///
/// # Examples
///
/// ```
/// use tracker_api::domain::search::{tokenize, KnownUrlRegistry};
///
/// let registry = KnownUrlRegistry::with_defaults();
/// let parsed = tokenize("id:42 Widget", &registry).unwrap();
/// assert_eq!(parsed.id_fragments, vec!["42:*A"]);
/// assert_eq!(parsed.word_fragments, vec!["widget:*"]);
/// ```
pub fn tokenize(raw: &str, registry: &KnownUrlRegistry) -> Result<ParsedQuery> {
    let trimmed = raw.trim_matches('/').trim_matches('"');

    let mut parsed = ParsedQuery::default();
    for part in trimmed.split_whitespace() {
        let part = match query_unescape(part) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(part, error = %e, "Unable to unescape search token");
                Cow::Borrowed(part)
            }
        };
        parsed.push(classify(&part, registry)?);
    }

    Ok(parsed)
}

/// Classify a single decoded token.
pub fn classify(part: &str, registry: &KnownUrlRegistry) -> Result<SearchToken> {
    if let Some(id) = part.strip_prefix(ID_PREFIX) {
        return Ok(SearchToken::IdFilter {
            value: format!("{id}{ID_LEXEME_SUFFIX}"),
        });
    }

    if let Some(type_id) = part.strip_prefix(TYPE_PREFIX) {
        if type_id.is_empty() {
            return Err(SearchError::bad_parameter("type", part));
        }
        let type_id =
            Uuid::parse_str(type_id).map_err(|_| SearchError::bad_parameter("type", type_id))?;
        return Ok(SearchToken::TypeFilter { type_id });
    }

    let lowered = part.to_lowercase();
    let query_fragment = if is_url(part) {
        url_to_query_fragment(registry, trim_protocol(&lowered))
    } else {
        format!("{}{PREFIX_MATCH}", sanitize_generic_url(&lowered))
    };

    Ok(SearchToken::WordFragment { query_fragment })
}

/// Whether `token` is a well-formed web URL, with or without protocol.
///
/// The host must be an IP address, `localhost` or a dotted domain name.
pub fn is_url(token: &str) -> bool {
    if token.is_empty()
        || token.len() >= MAX_URL_LENGTH
        || token.starts_with('.')
        || token.chars().any(char::is_whitespace)
    {
        return false;
    }

    let candidate = if token.contains("://") {
        Cow::Borrowed(token)
    } else {
        Cow::Owned(format!("http://{token}"))
    };

    let Ok(parsed) = Url::parse(&candidate) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https" | "ftp" | "ws" | "wss") {
        return false;
    }

    match parsed.host() {
        Some(Host::Domain(domain)) => {
            domain == "localhost"
                || (domain.contains('.') && !domain.starts_with('.') && !domain.contains(".."))
        }
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        None => false,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UnescapeError {
    #[error("invalid escape sequence '{0}'")]
    InvalidEscape(String),
    #[error("decoded token is not valid UTF-8")]
    InvalidUtf8,
}

/// Decode a query-string encoded token (`%XX` escapes, `+` as space).
pub fn query_unescape(part: &str) -> std::result::Result<Cow<'_, str>, UnescapeError> {
    if !part.contains(['%', '+']) {
        return Ok(Cow::Borrowed(part));
    }

    let bytes = part.as_bytes();
    for (i, _) in part.match_indices('%') {
        let valid = bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            let end = (i + 3).min(part.len());
            return Err(UnescapeError::InvalidEscape(
                String::from_utf8_lossy(&bytes[i..end]).into_owned(),
            ));
        }
    }

    let spaced = part.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| Cow::Owned(decoded.into_owned()))
        .map_err(|_| UnescapeError::InvalidUtf8)
}
