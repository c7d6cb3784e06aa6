use log::{error, info};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
struct CounterRecord {
    counter: u64,
}

/// Durable monotonic ticket counter backed by a single JSON file.
///
/// `next` returns the current value and persists value+1. A corrupt file is
/// reset rather than treated as fatal; a failed write is logged and the
/// in-memory value still returned, so numbering may repeat after a crash.
/// Single-process sequential use only.
#[derive(Debug, Clone)]
pub struct CounterStore {
    path: PathBuf,
}

impl CounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn next(&self) -> u64 {
        let mut counter = 1;

        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                if !content.trim().is_empty() {
                    match serde_json::from_str::<CounterRecord>(&content) {
                        Ok(record) => counter = record.counter.max(1),
                        Err(e) => {
                            error!("ticket counter file is corrupt, resetting: {e}");
                            self.persist(1).await;
                        }
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("ticket counter file not found, starting from 1");
            }
            Err(e) => {
                error!("error reading ticket counter, resetting: {e}");
                self.persist(1).await;
            }
        }

        self.persist(counter + 1).await;
        counter
    }

    async fn persist(&self, value: u64) {
        let record = CounterRecord { counter: value };
        let json = match serde_json::to_string_pretty(&record) {
            Ok(json) => json,
            Err(e) => {
                error!("error serializing ticket counter: {e}");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(&self.path, json).await {
            error!("error saving ticket counter: {e}");
        }
    }
}
