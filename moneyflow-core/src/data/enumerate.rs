//! Source enumeration: paginated listing of a collection.
//!
//! A page failure stops the listing and keeps what was already accumulated.
//! That outcome is reported as `Completeness::Partial` so the caller can
//! decide whether to proceed with partial data or abort.

use super::provider::SourceCatalog;
use crate::domain::SourceDocument;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Whether the listing reached the last page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Completeness {
    Complete,
    Partial { pages_fetched: usize, error: String },
}

/// Documents discovered in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enumeration {
    pub collection: String,
    pub documents: Vec<SourceDocument>,
    pub completeness: Completeness,
}

impl Enumeration {
    pub fn is_partial(&self) -> bool {
        matches!(self.completeness, Completeness::Partial { .. })
    }
}

/// List every document in `collection`, following page tokens.
pub fn enumerate_sources(catalog: &dyn SourceCatalog, collection: &str) -> Enumeration {
    let mut documents = Vec::new();
    let mut seen_tokens: HashSet<String> = HashSet::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    let completeness = loop {
        match catalog.list_page(collection, token.as_deref()) {
            Ok(page) => {
                pages += 1;
                tracing::debug!(
                    catalog = catalog.name(),
                    page = pages,
                    documents = page.documents.len(),
                    "listed page"
                );
                documents.extend(page.documents);

                match page.next_page_token {
                    None => break Completeness::Complete,
                    Some(next) => {
                        if !seen_tokens.insert(next.clone()) {
                            break Completeness::Partial {
                                pages_fetched: pages,
                                error: format!("page token '{next}' repeated"),
                            };
                        }
                        token = Some(next);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    catalog = catalog.name(),
                    pages_fetched = pages,
                    error = %e,
                    "listing stopped early"
                );
                break Completeness::Partial {
                    pages_fetched: pages,
                    error: e.to_string(),
                };
            }
        }
    };

    tracing::info!(
        collection,
        documents = documents.len(),
        partial = matches!(completeness, Completeness::Partial { .. }),
        "enumerated sources"
    );

    Enumeration {
        collection: collection.to_string(),
        documents,
        completeness,
    }
}
