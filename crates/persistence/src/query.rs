use chrono::{DateTime, Utc};

use crate::record::Record;

/// Builder for filtering the rows of one aggregate table by their audit
/// columns.
///
/// Results are ordered by creation time, then id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    /// Rows created by this actor.
    pub created_by: Option<String>,

    /// Rows created at or after this instant.
    pub created_after: Option<DateTime<Utc>>,

    /// Rows created at or before this instant.
    pub created_before: Option<DateTime<Utc>>,

    /// Rows last modified at or after this instant.
    pub modified_after: Option<DateTime<Utc>>,

    /// Maximum number of rows to return.
    pub limit: Option<usize>,

    /// Number of rows to skip.
    pub offset: Option<usize>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_by(mut self, actor: impl Into<String>) -> Self {
        self.created_by = Some(actor.into());
        self
    }

    pub fn created_after(mut self, at: DateTime<Utc>) -> Self {
        self.created_after = Some(at);
        self
    }

    pub fn created_before(mut self, at: DateTime<Utc>) -> Self {
        self.created_before = Some(at);
        self
    }

    pub fn modified_after(mut self, at: DateTime<Utc>) -> Self {
        self.modified_after = Some(at);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// True when `record` passes every filter. Paging is not considered.
    pub fn matches(&self, record: &Record) -> bool {
        let audit = &record.audit;
        if let Some(ref actor) = self.created_by
            && audit.created_by() != Some(actor.as_str())
        {
            return false;
        }
        if let Some(after) = self.created_after
            && !audit.created_at().is_some_and(|at| at >= after)
        {
            return false;
        }
        if let Some(before) = self.created_before
            && !audit.created_at().is_some_and(|at| at <= before)
        {
            return false;
        }
        if let Some(after) = self.modified_after
            && !audit.modified_at().is_some_and(|at| at >= after)
        {
            return false;
        }
        true
    }

    /// Applies ordering and paging to already filtered rows.
    pub(crate) fn page(&self, mut records: Vec<Record>) -> Vec<Record> {
        sort_records(&mut records);
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(usize::MAX);
        records.into_iter().skip(offset).take(limit).collect()
    }
}

/// Orders rows the way every store returns them: creation time, then id.
pub(crate) fn sort_records(records: &mut [Record]) {
    records.sort_by(|a, b| {
        a.audit
            .created_at()
            .cmp(&b.audit.created_at())
            .then(a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Duration;

    use super::*;
    use crate::record::AuditMetadata;
    use crate::{AggregateId, Version};

    fn record(created_by: Option<&str>, created_at: DateTime<Utc>) -> Record {
        Record {
            table: "exercises".into(),
            id: AggregateId::new(),
            version: Version::first(),
            audit: AuditMetadata::restore(
                Some(created_at),
                created_by.map(str::to_string),
                Some(created_at),
                created_by.map(str::to_string),
            ),
            columns: BTreeMap::new(),
        }
    }

    #[test]
    fn filters_by_creator() {
        let now = Utc::now();
        let query = RecordQuery::new().created_by("alice");
        assert!(query.matches(&record(Some("alice"), now)));
        assert!(!query.matches(&record(Some("bob"), now)));
        assert!(!query.matches(&record(None, now)));
    }

    #[test]
    fn time_window_is_inclusive() {
        let now = Utc::now();
        let query = RecordQuery::new()
            .created_after(now)
            .created_before(now + Duration::minutes(5));

        assert!(query.matches(&record(None, now)));
        assert!(query.matches(&record(None, now + Duration::minutes(5))));
        assert!(!query.matches(&record(None, now - Duration::seconds(1))));
    }

    #[test]
    fn paging_follows_creation_order() {
        let now = Utc::now();
        let rows: Vec<Record> = (0..5)
            .rev()
            .map(|i| record(None, now + Duration::seconds(i)))
            .collect();

        let page = RecordQuery::new().offset(1).limit(2).page(rows);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].audit.created_at(), Some(now + Duration::seconds(1)));
        assert_eq!(page[1].audit.created_at(), Some(now + Duration::seconds(2)));
    }
}
