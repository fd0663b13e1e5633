//! In-memory candidate catalog.
//!
//! `CandidateIndex` keeps records in insertion order with a name index for
//! detail lookups. It implements both store seams, which makes it the
//! catalog behind the CLI and the stand-in store in tests.

use crate::error::Result;
use crate::parser;
use crate::profile::normalize;
use crate::store::{CandidateStore, DetailStore, StoreQuery};
use crate::types::{CandidateDetail, CandidateRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Default, Clone)]
pub struct CandidateIndex {
    records: Vec<CandidateRecord>,
    /// normalized name → position in `records`
    by_name: HashMap<String, usize>,
}

impl CandidateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = CandidateRecord>) -> Self {
        let mut index = Self::new();
        for record in records {
            index.insert(record);
        }
        index
    }

    /// Load a catalog file (see `parser::load_candidates`).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let records = parser::load_candidates(path)?;
        tracing::info!("Loaded {} candidate records from {}", records.len(), path.display());
        Ok(Self::from_records(records))
    }

    /// Insert a record. A record with the same (case-insensitive) name
    /// replaces the earlier one in place.
    pub fn insert(&mut self, record: CandidateRecord) {
        let key = normalize(&record.name);
        match self.by_name.get(&key) {
            Some(&pos) => self.records[pos] = record,
            None => {
                self.by_name.insert(key, self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&CandidateRecord> {
        self.by_name.get(&normalize(name)).map(|&pos| &self.records[pos])
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CandidateStore for CandidateIndex {
    fn name(&self) -> &str {
        "in-memory catalog"
    }

    async fn query(&self, query: &StoreQuery) -> Result<Vec<CandidateRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DetailStore for CandidateIndex {
    async fn fetch(&self, name: &str) -> Result<Option<CandidateDetail>> {
        Ok(self.get(name).map(CandidateDetail::from_record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, min_gpa: Option<f64>) -> CandidateRecord {
        let mut record = CandidateRecord::new(name, "Testland");
        record.min_gpa = min_gpa;
        record
    }

    #[test]
    fn test_insert_and_lookup_case_insensitive() {
        let mut index = CandidateIndex::new();
        index.insert(record("Politecnico di Milano", Some(75.0)));

        assert_eq!(index.len(), 1);
        assert!(index.get("politecnico di milano ").is_some());
        assert!(index.get("Politecnico di Torino").is_none());
    }

    #[test]
    fn test_insert_replaces_same_name() {
        let mut index = CandidateIndex::new();
        index.insert(record("KAIST", Some(80.0)));
        index.insert(record("kaist", Some(90.0)));

        assert_eq!(index.len(), 1);
        assert_eq!(index.get("KAIST").unwrap().min_gpa, Some(90.0));
    }

    #[tokio::test]
    async fn test_query_preserves_order_and_applies_predicates() {
        let index = CandidateIndex::from_records(vec![
            record("A", Some(60.0)),
            record("B", Some(95.0)),
            record("C", None),
        ]);

        let query = StoreQuery {
            gpa_at_least: Some(85.0),
            ..StoreQuery::all()
        };
        let names: Vec<String> = index
            .query(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();

        assert_eq!(names, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_fetch_detail() {
        let index = CandidateIndex::from_records(vec![record("CTU", Some(70.0))]);

        let detail = index.fetch("ctu").await.unwrap().unwrap();
        assert_eq!(detail.name, "CTU");
        assert!(index.fetch("missing").await.unwrap().is_none());
    }
}
