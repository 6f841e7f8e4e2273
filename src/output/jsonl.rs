//! JSON-lines dataset sink

use crate::output::traits::{OutputResult, Sink};
use crate::output::SinkRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Writes one JSON object per line to a dataset file
///
/// The file is opened in append mode so a resumed crawl extends the
/// dataset of the interrupted run.
pub struct JsonlSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonlSink {
    /// Opens (or creates) the dataset file at the given path
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl Sink for JsonlSink {
    fn push(&self, record: &SinkRecord) -> OutputResult<()> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.writer.lock().unwrap();
        writeln!(writer, "{}", line)?;
        Ok(())
    }

    fn finalize(&self) -> OutputResult<()> {
        let mut writer = self.writer.lock().unwrap();
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{DebugRecord, OfferRecord};

    fn offer(seller: &str) -> SinkRecord {
        SinkRecord::Offer(OfferRecord {
            seller: seller.to_string(),
            price: "$999.00".to_string(),
            shipping: "free".to_string(),
            description: None,
            title: Some("Zenbook 14".to_string()),
            item_url: "https://example.com/dp/B08X1".to_string(),
            keyword: "asus zenbook".to_string(),
        })
    }

    #[test]
    fn test_writes_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offers.jsonl");

        let sink = JsonlSink::create(&path).unwrap();
        sink.push(&offer("TechWorld")).unwrap();
        sink.push(&SinkRecord::Failure(DebugRecord::for_unroutable(
            "https://example.com/x",
            "unknown stage",
        )))
        .unwrap();
        sink.finalize().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["seller"], "TechWorld");

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert!(second.get("#debug").is_some());
    }

    #[test]
    fn test_append_extends_existing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offers.jsonl");

        {
            let sink = JsonlSink::create(&path).unwrap();
            sink.push(&offer("TechWorld")).unwrap();
            sink.finalize().unwrap();
        }
        {
            let sink = JsonlSink::create(&path).unwrap();
            sink.push(&offer("LaptopHut")).unwrap();
            sink.finalize().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
