//! In-memory sink

use crate::output::traits::{OutputResult, PageRecord, PageSink};

/// Collects records in arrival order
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<PageRecord>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[PageRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PageRecord> {
        self.records
    }

    pub fn successes(&self) -> impl Iterator<Item = &PageRecord> {
        self.records.iter().filter(|record| record.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &PageRecord> {
        self.records.iter().filter(|record| !record.is_success())
    }

    /// True once the pipeline has delivered its last record
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl PageSink for MemorySink {
    fn accept(&mut self, record: &PageRecord) -> OutputResult<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RegionSource;
    use crate::url::normalize;
    use url::Url;

    #[test]
    fn test_memory_sink_keeps_order() {
        let base = Url::parse("https://site.test/").unwrap();
        let mut sink = MemorySink::new();

        sink.accept(&PageRecord::failed(
            normalize("a.html", &base).unwrap(),
            None,
            "request timed out",
            2,
        ))
        .unwrap();
        sink.accept(&PageRecord::success(
            normalize("b.html", &base).unwrap(),
            None,
            "b\n".to_string(),
            RegionSource::Selector,
        ))
        .unwrap();
        assert!(!sink.is_finished());
        sink.finish().unwrap();

        assert!(sink.is_finished());
        assert_eq!(sink.successes().count(), 1);
        assert_eq!(sink.failures().count(), 1);
        let urls: Vec<&str> = sink.records().iter().map(|r| r.source_url.as_str()).collect();
        assert_eq!(urls, vec!["https://site.test/a.html", "https://site.test/b.html"]);
    }
}
