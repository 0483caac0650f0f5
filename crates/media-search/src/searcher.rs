//! Prefix search over item names and descriptions.

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, RegexQuery};
use tantivy::schema::Value;
use tantivy::{IndexReader, TantivyDocument};
use tracing::debug;

use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::schema::ItemSchema;

/// A matching item with its relevance score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Item identifier
    pub identifier: String,
    /// Stored display name
    pub name: String,
    /// Relevance score
    pub score: f32,
}

/// Searcher for item queries.
pub struct ItemSearcher {
    reader: IndexReader,
    schema: ItemSchema,
}

impl ItemSearcher {
    /// Create a new searcher from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        Ok(Self {
            reader: index.reader()?,
            schema: index.schema().clone(),
        })
    }

    /// Reload the reader to see recent commits.
    pub fn reload(&self) -> Result<(), SearchError> {
        self.reader.reload()?;
        Ok(())
    }

    /// Number of committed documents visible to this searcher.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Search with user-entered text.
    ///
    /// Every word must prefix-match a token of the name or description.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        let terms = query_terms(query_str);
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(terms.len());
        for term in &terms {
            let pattern = format!("{term}.*");
            let per_field: Vec<(Occur, Box<dyn Query>)> = vec![
                (
                    Occur::Should,
                    Box::new(RegexQuery::from_pattern(&pattern, self.schema.name)?),
                ),
                (
                    Occur::Should,
                    Box::new(RegexQuery::from_pattern(&pattern, self.schema.description)?),
                ),
            ];
            clauses.push((Occur::Must, Box::new(BooleanQuery::new(per_field))));
        }
        let query = BooleanQuery::new(clauses);

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            let identifier = doc
                .get_first(self.schema.identifier)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let name = doc
                .get_first(self.schema.name)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            hits.push(SearchHit {
                identifier,
                name,
                score,
            });
        }

        debug!(query = query_str, results = hits.len(), "Search complete");
        Ok(hits)
    }
}

/// Split user text the way the default tokenizer splits indexed text.
fn query_terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}
