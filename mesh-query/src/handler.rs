//! Producer-side query handler

use mesh_core::{Record, RecordQuery};
use tokio::sync::RwLock;
use tracing::debug;

/// Serves queries against a producer's local record set
///
/// Matching records are returned in storage order, truncated at the
/// query's limit. No ranking is applied.
pub struct LocalQueryHandler {
    records: RwLock<Vec<Record>>,
}

impl LocalQueryHandler {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Append records to the local set
    pub async fn add_records(&self, mut records: Vec<Record>) {
        self.records.write().await.append(&mut records);
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Evaluate a query against the local set
    pub async fn handle(&self, query: &RecordQuery) -> Vec<Record> {
        let records = self.records.read().await;
        let matched: Vec<Record> = records
            .iter()
            .filter(|r| matches(r, query))
            .take(query.limit)
            .cloned()
            .collect();
        debug!(
            source = %query.source,
            matched = matched.len(),
            limit = query.limit,
            "query handled"
        );
        matched
    }
}

impl Default for LocalQueryHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(record: &Record, query: &RecordQuery) -> bool {
    if record.source != query.source {
        return false;
    }
    if let Some(start) = query.start_time {
        if record.captured_at < start {
            return false;
        }
    }
    if let Some(end) = query.end_time {
        if record.captured_at > end {
            return false;
        }
    }
    if !query.labels.is_empty() {
        match &record.label {
            Some(label) if query.labels.iter().any(|l| l == label) => {}
            _ => return false,
        }
    }
    if !query.keywords.is_empty() {
        let text = record.searchable_text().to_lowercase();
        if !query
            .keywords
            .iter()
            .any(|k| text.contains(&k.to_lowercase()))
        {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use mesh_core::RecordSource;

    fn record(uri: &str, source: RecordSource, label: Option<&str>, body: &str) -> Record {
        Record::new(
            uri,
            source,
            label.map(|l| l.to_string()),
            body.as_bytes().to_vec(),
            Utc::now(),
        )
    }

    fn fixture() -> Vec<Record> {
        vec![
            record("portal:1", RecordSource::Portal, Some("riverside"), "three rooms near the park"),
            record("portal:2", RecordSource::Portal, Some("downtown"), "studio flat"),
            record("registry:1", RecordSource::Registry, None, "deed transfer"),
            record("portal:3", RecordSource::Portal, None, "garden house with park view"),
        ]
    }

    #[tokio::test]
    async fn test_source_filter() {
        let handler = LocalQueryHandler::with_records(fixture());
        let results = handler
            .handle(&RecordQuery::new(RecordSource::Registry, 10))
            .await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].uri, "registry:1");
    }

    #[tokio::test]
    async fn test_keyword_filter_any_match() {
        let handler = LocalQueryHandler::with_records(fixture());
        let query = RecordQuery::new(RecordSource::Portal, 10)
            .with_keywords(vec!["PARK".to_string(), "missing".to_string()]);
        let results = handler.handle(&query).await;
        let uris: Vec<&str> = results.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, vec!["portal:1", "portal:3"]);
    }

    #[tokio::test]
    async fn test_label_filter() {
        let handler = LocalQueryHandler::with_records(fixture());
        let query = RecordQuery::new(RecordSource::Portal, 10)
            .with_labels(vec!["downtown".to_string()]);
        let results = handler.handle(&query).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].uri, "portal:2");
    }

    #[tokio::test]
    async fn test_time_range_inclusive() {
        let now = Utc::now();
        let handler = LocalQueryHandler::with_records(fixture());
        let query = RecordQuery::new(RecordSource::Portal, 10)
            .with_time_range(Some(now - Duration::minutes(1)), Some(now + Duration::minutes(1)));
        assert_eq!(handler.handle(&query).await.len(), 3);

        let past = RecordQuery::new(RecordSource::Portal, 10)
            .with_time_range(None, Some(now - Duration::hours(1)));
        assert!(handler.handle(&past).await.is_empty());
    }

    #[tokio::test]
    async fn test_limit_in_storage_order() {
        let handler = LocalQueryHandler::with_records(fixture());
        let results = handler
            .handle(&RecordQuery::new(RecordSource::Portal, 2))
            .await;
        let uris: Vec<&str> = results.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, vec!["portal:1", "portal:2"]);
    }
}
