//! In-memory port implementations shared by unit tests.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use apix_domain::{HistoryEntry, RequestSpec, ResponseSpec};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ports::{
    Clock, FileSystemError, HistoryLog, HttpClient, HttpClientError, Listing, Record, RecordStore,
    StoreError, validate_key,
};

/// Map-backed record store that can be told to fail writes for given keys.
pub struct MemoryStore<R> {
    records: Mutex<BTreeMap<String, R>>,
    failing_puts: Mutex<HashSet<String>>,
}

impl<R: Record> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            failing_puts: Mutex::new(HashSet::new()),
        }
    }

    /// Inserts without going through `put`, bypassing failure injection.
    pub fn seed(&self, record: R) {
        self.records
            .lock()
            .unwrap()
            .insert(record.key().to_string(), record);
    }

    pub fn fail_puts_for(&self, key: &str) {
        self.failing_puts.lock().unwrap().insert(key.to_string());
    }

    pub fn snapshot(&self) -> Vec<R> {
        self.records.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryStore<R> {
    async fn put(&self, record: &R) -> Result<(), StoreError> {
        validate_key(R::KIND, record.key())?;
        if self.failing_puts.lock().unwrap().contains(record.key()) {
            return Err(StoreError::Persistence {
                kind: R::KIND,
                key: record.key().to_string(),
                source: FileSystemError::Io(std::io::Error::other("injected failure")),
            });
        }
        self.seed(record.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<R, StoreError> {
        self.records
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: R::KIND,
                key: key.to_string(),
            })
    }

    async fn list(&self) -> Result<Listing<R>, StoreError> {
        Ok(Listing {
            records: self.snapshot(),
            warnings: Vec::new(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(R::KIND, key)?;
        self.records.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Vector-backed history log.
#[derive(Default)]
pub struct MemoryHistory {
    entries: Mutex<Vec<HistoryEntry>>,
    fail: bool,
}

impl MemoryHistory {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl HistoryLog for MemoryHistory {
    async fn append(&self, request: &RequestSpec) -> Result<HistoryEntry, StoreError> {
        if self.fail {
            return Err(StoreError::Persistence {
                kind: crate::ports::RecordKind::History,
                key: "history".to_string(),
                source: FileSystemError::Io(std::io::Error::other("injected failure")),
            });
        }
        let mut entries = self.entries.lock().unwrap();
        let entry = HistoryEntry::new(entries.len(), request.clone());
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn entries(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn get(&self, id: usize) -> Result<HistoryEntry, StoreError> {
        self.entries
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: crate::ports::RecordKind::History,
                key: id.to_string(),
            })
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}

/// HTTP client returning a canned result and recording what it was sent.
pub struct MockHttpClient {
    response: Result<ResponseSpec, HttpClientError>,
    pub sent: Mutex<Vec<RequestSpec>>,
}

impl MockHttpClient {
    pub fn success() -> Self {
        Self {
            response: Ok(ResponseSpec::new(
                200u16,
                BTreeMap::new(),
                b"OK".to_vec(),
                Duration::from_millis(50),
            )),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn status(code: u16) -> Self {
        Self {
            response: Ok(ResponseSpec::new(code, BTreeMap::new(), Vec::new(), Duration::ZERO)),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn error(err: HttpClientError) -> Self {
        Self {
            response: Err(err),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn last_sent(&self) -> Option<RequestSpec> {
        self.sent.lock().unwrap().last().cloned()
    }
}

impl HttpClient for MockHttpClient {
    fn execute(
        &self,
        request: &RequestSpec,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + '_>> {
        self.sent.lock().unwrap().push(request.clone());
        let result = self.response.clone();
        Box::pin(async move { result })
    }
}

/// Clock frozen at a fixed instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
