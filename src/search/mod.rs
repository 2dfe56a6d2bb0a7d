//! Tantivy-based supplier search index.
//!
//! Provides full-text search over suppliers with field boosting.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, BoostQuery, Occur, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::filter::fold_text;
use crate::models::Supplier;

const BOOST_NAME: f32 = 10.0;
const BOOST_CLASSIFICATION: f32 = 6.0;
const BOOST_LOCATION: f32 = 4.0;
const BOOST_CONTACT: f32 = 2.0;

/// Largest page a search returns.
pub const MAX_SEARCH_LIMIT: usize = 100;
/// Deepest offset a search pages to.
pub const MAX_SEARCH_OFFSET: usize = 10_000;

/// Search hit with relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub supplier_id: String,
    pub score: f32,
}

/// One page of hits plus the number of documents that matched overall.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub hits: Vec<SearchResult>,
    pub total: usize,
}

/// Search index schema fields.
struct SearchFields {
    supplier_id: Field,
    name: Field,
    classification: Field,
    location: Field,
    contact: Field,
}

/// Tantivy search index for suppliers.
pub struct SupplierIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SupplierIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let supplier_id = schema_builder.add_text_field("supplier_id", STRING | STORED);
        let name = schema_builder.add_text_field("name", TEXT);
        let classification = schema_builder.add_text_field("classification", TEXT);
        let location = schema_builder.add_text_field("location", TEXT);
        let contact = schema_builder.add_text_field("contact", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            supplier_id,
            name,
            classification,
            location,
            contact,
        };

        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from suppliers.
    pub async fn rebuild(&self, suppliers: &[Supplier]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for supplier in suppliers {
            writer.add_document(self.create_document(supplier))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} suppliers", suppliers.len());
        Ok(())
    }

    /// Index or re-index a batch of suppliers with a single commit.
    pub async fn index_suppliers(&self, suppliers: &[Supplier]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        for supplier in suppliers {
            let term = tantivy::Term::from_field_text(self.fields.supplier_id, &supplier.id);
            writer.delete_term(term);
            writer.add_document(self.create_document(supplier))?;
        }
        writer.commit()?;

        self.reader.reload()?;
        Ok(())
    }

    /// Index or re-index a single supplier.
    pub async fn index_supplier(&self, supplier: &Supplier) -> Result<(), AppError> {
        self.index_suppliers(std::slice::from_ref(supplier)).await
    }

    /// Remove a supplier from the index.
    pub async fn remove_supplier(&self, supplier_id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = tantivy::Term::from_field_text(self.fields.supplier_id, supplier_id);
        writer.delete_term(term);
        writer.commit()?;

        self.reader.reload()?;
        Ok(())
    }

    /// Search for suppliers matching the query.
    pub fn search(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<SearchPage, AppError> {
        if offset > MAX_SEARCH_OFFSET {
            return Err(AppError::BadRequest(format!(
                "offset must be at most {}",
                MAX_SEARCH_OFFSET
            )));
        }
        let limit = limit.min(MAX_SEARCH_LIMIT);
        let query_str = fold_text(query_str.trim());
        if query_str.is_empty() || limit == 0 {
            return Ok(SearchPage::default());
        }

        let searcher = self.reader.searcher();

        let field_queries = [
            (self.fields.name, BOOST_NAME),
            (self.fields.classification, BOOST_CLASSIFICATION),
            (self.fields.location, BOOST_LOCATION),
            (self.fields.contact, BOOST_CONTACT),
        ];

        // Query syntax in user text (stray parentheses, colons) is dropped
        // rather than rejected.
        let mut subqueries: Vec<(Occur, Box<dyn tantivy::query::Query>)> = Vec::new();
        for (field, boost) in field_queries {
            let field_parser = QueryParser::for_index(&self.index, vec![field]);
            let (field_query, errors) = field_parser.parse_query_lenient(&query_str);
            if !errors.is_empty() {
                tracing::debug!("Lenient parse of {:?}: {:?}", query_str, errors);
            }
            subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
        }
        let combined_query = BooleanQuery::new(subqueries);

        let (total, top_docs) = searcher
            .search(
                &combined_query,
                &(Count, TopDocs::with_limit(limit.saturating_add(offset))),
            )
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let hits = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let supplier_id = doc.get_first(self.fields.supplier_id)?.as_str()?.to_string();
                Some(SearchResult { supplier_id, score })
            })
            .collect();

        Ok(SearchPage { hits, total })
    }

    /// Create a Tantivy document from a supplier. Text is folded so that
    /// accented and unaccented queries hit the same terms.
    fn create_document(&self, supplier: &Supplier) -> TantivyDocument {
        let classification = format!(
            "{} {} {} {}",
            supplier.parts_type.as_str(),
            supplier.parts_type.label(),
            supplier.specialization.as_str(),
            supplier.specialization.label()
        );

        let address = &supplier.address;
        let location = [
            &address.street,
            &address.neighborhood,
            &address.city,
            &address.state,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

        let contact = [&supplier.contact_name, &supplier.email]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");

        doc!(
            self.fields.supplier_id => supplier.id.clone(),
            self.fields.name => fold_text(&supplier.name),
            self.fields.classification => classification,
            self.fields.location => fold_text(&location),
            self.fields.contact => fold_text(&contact)
        )
    }
}
