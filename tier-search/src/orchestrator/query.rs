//! Scoped query expressions in the RediSearch query dialect.
//!
//! `@field:(a b)` requires every term inside `field`, `|` ORs
//! sub-expressions, and juxtaposition ANDs them. Tag filters use
//! `@field:{value}`.

use crate::types::{Query, Tier};

/// Fields searched by the body tier.
pub const BODY_FIELDS: &[&str] = &["content", "description"];

/// Expression requiring every term to match within `field`.
///
/// Returns an empty string when `terms` is empty.
pub fn field_query(terms: &[String], field: &str) -> String {
    if terms.is_empty() {
        return String::new();
    }
    format!("@{field}:({})", terms.join(" "))
}

/// OR across `fields`, each branch requiring every term within that one field.
///
/// Returns an empty string when `terms` or `fields` is empty.
pub fn multi_field_query(terms: &[String], fields: &[&str]) -> String {
    if terms.is_empty() || fields.is_empty() {
        return String::new();
    }
    let branches: Vec<String> = fields.iter().map(|f| field_query(terms, f)).collect();
    format!("({})", branches.join("|"))
}

/// Escape a tag value so it cannot close the braces or split into several tags.
pub fn escape_tag(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if (c.is_ascii_punctuation() && c != '_') || c.is_whitespace() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the per-tier expressions for one query, with its filters attached.
#[derive(Debug, Clone)]
pub struct TierQueryBuilder<'a> {
    query: &'a Query,
    terms: &'a [String],
}

impl<'a> TierQueryBuilder<'a> {
    pub fn new(query: &'a Query, terms: &'a [String]) -> Self {
        Self { query, terms }
    }

    /// The raw query text plus filters, used by the count probe and the any tier.
    pub fn raw(&self) -> String {
        self.with_filters(self.query.text.clone())
    }

    /// The expression for `tier`, filters included.
    pub fn tier(&self, tier: Tier) -> String {
        match tier {
            Tier::Title => self.with_filters(field_query(self.terms, "title")),
            Tier::Body => self.with_filters(multi_field_query(self.terms, BODY_FIELDS)),
            Tier::Any => self.raw(),
        }
    }

    fn with_filters(&self, mut expression: String) -> String {
        if let Some(ref language) = self.query.language {
            expression.push_str(&format!(" @language:{{{}}}", escape_tag(language)));
        }
        if let Some(ref category) = self.query.category {
            expression.push_str(&format!(" @category:{{{}}}", escape_tag(category)));
        }
        expression
    }
}
