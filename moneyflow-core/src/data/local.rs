//! Local-directory backends: a folder of per-day CSV exports acts as the
//! collection, and each file is one tabular document.

use super::provider::{CatalogPage, SheetSource, SourceCatalog, SourceError};
use crate::domain::SourceDocument;
use std::fs;
use std::path::{Path, PathBuf};

/// Lists files with a given suffix under `root/<collection>`, sorted by name.
///
/// Page tokens are decimal offsets into the sorted listing.
pub struct DirectoryCatalog {
    root: PathBuf,
    suffix: String,
    page_size: usize,
}

impl DirectoryCatalog {
    pub fn new(root: impl Into<PathBuf>, suffix: impl Into<String>, page_size: usize) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into().to_ascii_lowercase(),
            page_size: page_size.max(1),
        }
    }

    fn collection_dir(&self, collection: &str) -> PathBuf {
        if collection.is_empty() || collection == "." {
            self.root.clone()
        } else {
            self.root.join(collection)
        }
    }

    fn list_all(&self, collection: &str) -> Result<Vec<SourceDocument>, SourceError> {
        let dir = self.collection_dir(collection);
        let entries = fs::read_dir(&dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound {
                id: dir.display().to_string(),
            },
            _ => SourceError::Io(e),
        })?;

        let mut documents = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.to_ascii_lowercase().ends_with(&self.suffix) {
                continue;
            }
            documents.push(SourceDocument::new(
                path.display().to_string(),
                name,
                collection,
            ));
        }
        documents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(documents)
    }
}

impl SourceCatalog for DirectoryCatalog {
    fn name(&self) -> &str {
        "directory"
    }

    fn list_page(
        &self,
        collection: &str,
        page_token: Option<&str>,
    ) -> Result<CatalogPage, SourceError> {
        let offset: usize = match page_token {
            None => 0,
            Some(t) => t
                .parse()
                .map_err(|_| SourceError::Malformed(format!("bad page token '{t}'")))?,
        };

        let all = self.list_all(collection)?;
        let end = (offset + self.page_size).min(all.len());
        let documents = all.get(offset..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_page_token = (end < all.len()).then(|| end.to_string());

        Ok(CatalogPage {
            documents,
            next_page_token,
        })
    }
}

/// Reads a CSV file (document id = path) as a rectangular cell range.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvSheetSource;

impl SheetSource for CsvSheetSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_values(&self, document: &SourceDocument) -> Result<Vec<Vec<String>>, SourceError> {
        let file = fs::File::open(&document.id).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound {
                id: document.id.clone(),
            },
            _ => SourceError::Io(e),
        })?;
        read_csv_values(file)
    }
}

/// Parse CSV bytes into rows of cells. Ragged rows are kept as-is.
pub fn read_csv_values<R: std::io::Read>(reader: R) -> Result<Vec<Vec<String>>, SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut values = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| SourceError::Malformed(format!("csv: {e}")))?;
        values.push(record.iter().map(|c| c.to_string()).collect::<Vec<_>>());
    }

    if let Some(first) = values.first_mut().and_then(|row| row.first_mut()) {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }
    Ok(values)
}

/// Document handle for a single local file.
pub fn local_document(path: &Path) -> SourceDocument {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let collection = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    SourceDocument::new(path.display().to_string(), name, collection)
}
