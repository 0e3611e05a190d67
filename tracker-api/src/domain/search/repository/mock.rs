//! In-memory collaborators for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::models::{
    WorkItem, WorkItemStorage, WorkItemType, SYSTEM_DESCRIPTION, SYSTEM_TITLE,
};
use crate::domain::search::traits::{
    Result, SearchError, TypeHierarchy, WorkItemConverter, WorkItemStore,
};
use crate::domain::search::types::{StorePage, StoreQuery};

/// Mock work item store backed by a Vec.
///
/// Evaluates the compiled `tsquery` against the words of the title and
/// description fields plus the item ID, ranks every match equally and
/// orders by most recent update.
#[derive(Clone, Default)]
pub struct MockWorkItemStore {
    items: Arc<RwLock<Vec<WorkItemStorage>>>,
    call_count: Arc<AtomicUsize>,
    failure: Option<String>,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl MockWorkItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(self, items: Vec<WorkItemStorage>) -> Self {
        self.items.write().unwrap().extend(items);
        self
    }

    /// Make every search fail as if the database rejected the query.
    pub fn failing_with(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Delay every search, e.g. to trigger timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times `search` was called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkItemStore for MockWorkItemStore {
    async fn search(&self, query: &StoreQuery) -> Result<StorePage> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(SearchError::internal(message.clone()));
        }

        let expression = parse_expression(query.expression.as_str())
            .ok_or_else(|| SearchError::internal("syntax error in tsquery"))?;

        let mut matched: Vec<WorkItemStorage> = self
            .items
            .read()
            .unwrap()
            .iter()
            .filter(|item| {
                query
                    .type_scope
                    .as_ref()
                    .map_or(true, |scope| scope.contains(&item.type_id))
            })
            .filter(|item| query.space_id.map_or(true, |space| item.space_id == space))
            .filter(|item| expression.matches(&lexemes(item)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let total = matched.len() as u64;
        let offset = query.pagination.offset.unwrap_or(0) as usize;
        let limit = query.pagination.limit.map_or(usize::MAX, |l| l as usize);
        let rows: Vec<_> = matched.into_iter().skip(offset).take(limit).collect();

        // a windowed count is only visible on returned rows
        let total_count = if rows.is_empty() { 0 } else { total };
        Ok(StorePage { rows, total_count })
    }
}

/// Mock type catalog holding a fixed set of types.
#[derive(Clone, Default)]
pub struct MockTypeCatalog {
    types: Arc<Vec<WorkItemType>>,
}

impl MockTypeCatalog {
    pub fn new(types: Vec<WorkItemType>) -> Self {
        Self {
            types: Arc::new(types),
        }
    }

    fn find(&self, id: Uuid) -> Option<&WorkItemType> {
        self.types.iter().find(|wit| wit.id == id)
    }
}

#[async_trait]
impl TypeHierarchy for MockTypeCatalog {
    async fn descendants_or_self(&self, type_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        let ancestors: Vec<&WorkItemType> =
            type_ids.iter().filter_map(|id| self.find(*id)).collect();
        Ok(self
            .types
            .iter()
            .filter(|wit| ancestors.iter().any(|ancestor| wit.is_descendant_or_self(ancestor)))
            .map(|wit| wit.id)
            .collect())
    }
}

#[async_trait]
impl WorkItemConverter for MockTypeCatalog {
    async fn convert(&self, row: WorkItemStorage) -> Result<WorkItem> {
        let wit = self
            .find(row.type_id)
            .ok_or_else(|| {
                SearchError::internal(format!("unknown work item type {}", row.type_id))
            })?;
        Ok(wit.convert_storage(row)?)
    }
}

fn lexemes(item: &WorkItemStorage) -> Vec<String> {
    let mut words = vec![item.id.to_string()];
    for field in [SYSTEM_TITLE, SYSTEM_DESCRIPTION] {
        if let Some(text) = item.fields.0.get(field).and_then(|v| v.as_str()) {
            for word in text.split_whitespace() {
                let word = word.to_lowercase();
                words.extend(
                    word.split(|c: char| !c.is_alphanumeric())
                        .filter(|part| !part.is_empty())
                        .map(str::to_string),
                );
                words.push(word);
            }
        }
    }
    words
}

/// Boolean lexeme expression in the subset of `tsquery` syntax the query
/// compiler emits.
#[derive(Debug, PartialEq)]
enum Expr {
    Lexeme { text: String, prefix: bool },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn matches(&self, words: &[String]) -> bool {
        match self {
            Expr::Lexeme { text, prefix: true } => {
                words.iter().any(|w| w.starts_with(text.as_str()))
            }
            Expr::Lexeme { text, prefix: false } => words.iter().any(|w| w == text),
            Expr::And(a, b) => a.matches(words) && b.matches(words),
            Expr::Or(a, b) => a.matches(words) || b.matches(words),
        }
    }
}

fn parse_expression(input: &str) -> Option<Expr> {
    let mut chars = input.chars().peekable();
    let expr = parse_or(&mut chars)?;
    skip_spaces(&mut chars);
    chars.peek().is_none().then_some(expr)
}

fn skip_spaces(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn parse_or(chars: &mut Peekable<Chars<'_>>) -> Option<Expr> {
    let mut left = parse_and(chars)?;
    loop {
        skip_spaces(chars);
        if chars.next_if_eq(&'|').is_none() {
            return Some(left);
        }
        left = Expr::Or(Box::new(left), Box::new(parse_and(chars)?));
    }
}

fn parse_and(chars: &mut Peekable<Chars<'_>>) -> Option<Expr> {
    let mut left = parse_factor(chars)?;
    loop {
        skip_spaces(chars);
        if chars.next_if_eq(&'&').is_none() {
            return Some(left);
        }
        left = Expr::And(Box::new(left), Box::new(parse_factor(chars)?));
    }
}

fn parse_factor(chars: &mut Peekable<Chars<'_>>) -> Option<Expr> {
    skip_spaces(chars);
    if chars.next_if_eq(&'(').is_some() {
        let inner = parse_or(chars)?;
        skip_spaces(chars);
        chars.next_if_eq(&')')?;
        return Some(inner);
    }

    let mut text = String::new();
    let mut prefix = false;
    while let Some(&c) = chars.peek() {
        match c {
            '\\' => {
                chars.next();
                text.push(chars.next()?);
            }
            ':' => {
                chars.next();
                prefix = chars.next_if_eq(&'*').is_some();
                // weight letters
                while chars.next_if(|c| c.is_ascii_alphabetic()).is_some() {}
                break;
            }
            c if c.is_whitespace() || matches!(c, '&' | '|' | '(' | ')') => break,
            c => {
                chars.next();
                text.push(c);
            }
        }
    }

    (!text.is_empty()).then(|| Expr::Lexeme {
        text: text.to_lowercase(),
        prefix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Fields;
    use crate::domain::search::types::{CompiledQuery, Pagination};
    use serde_json::json;
    use sqlx::types::Json;
    use time::OffsetDateTime;

    fn lexeme(text: &str, prefix: bool) -> Expr {
        Expr::Lexeme {
            text: text.to_string(),
            prefix,
        }
    }

    fn item(id: i64, title: &str) -> WorkItemStorage {
        let mut fields = Fields::new();
        fields.insert(SYSTEM_TITLE.to_string(), json!(title));
        WorkItemStorage {
            id,
            type_id: Uuid::nil(),
            version: 0,
            fields: Json(fields),
            execution_order: 0.0,
            space_id: Uuid::nil(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn query(expression: &str) -> StoreQuery {
        StoreQuery {
            expression: CompiledQuery::new(expression),
            type_scope: None,
            space_id: None,
            pagination: Pagination::default(),
        }
    }

    #[test]
    fn parses_and_binds_tighter_than_or() {
        let expr = parse_expression("a:* | b:* & c").unwrap();
        assert_eq!(
            expr,
            Expr::Or(
                Box::new(lexeme("a", true)),
                Box::new(Expr::And(Box::new(lexeme("b", true)), Box::new(lexeme("c", false))))
            )
        );
    }

    #[test]
    fn parses_escapes_and_weights() {
        assert_eq!(parse_expression("42:*A").unwrap(), lexeme("42", true));
        assert_eq!(parse_expression("a\\:b:*").unwrap(), lexeme("a:b", true));
    }

    #[test]
    fn rejects_unbalanced_parentheses() {
        assert!(parse_expression("(a:* | b:*").is_none());
        assert!(parse_expression("a:* )").is_none());
    }

    #[tokio::test]
    async fn search_matches_prefixes_and_counts() {
        let store = MockWorkItemStore::new().with_items(vec![
            item(1, "Widget factory"),
            item(2, "Gadget"),
        ]);

        let page = store.search(&query("widg:*")).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.rows[0].id, 1);

        let page = store.search(&query("(2:* | nothing:*)")).await.unwrap();
        assert_eq!(page.rows[0].id, 2);
        assert_eq!(store.call_count(), 2);
    }

    #[tokio::test]
    async fn search_rejects_malformed_expression() {
        let store = MockWorkItemStore::new();
        assert!(store.search(&query("(a:*")).await.is_err());
    }
}
