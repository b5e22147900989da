pub mod store;

use crate::errors::Error;
use crate::job::{Job, JobStatus};
use crate::logging::*;
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::result::Result;
use std::str::FromStr;
use std::sync::Arc;

pub use store::{FileStore, KeyValueStore, MemoryStore};


const STATUS_KEY_PREFIX: &str = "video_status_";
const CONTENT_KEY_PREFIX: &str = "lesson_content_";

/// How long an entry stays fresh, checked when it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Job status and lesson content: 24 hours.
    Content,
    /// Catalogue data such as avatars and voices: 30 minutes.
    ReferenceData,
}

impl CachePolicy {
    pub fn ttl(self) -> TimeDelta {
        match self {
            CachePolicy::Content => TimeDelta::hours(24),
            CachePolicy::ReferenceData => TimeDelta::minutes(30),
        }
    }

    pub fn for_key(key: &str) -> Self {
        if key.starts_with(STATUS_KEY_PREFIX) || key.starts_with(CONTENT_KEY_PREFIX) {
            CachePolicy::Content
        } else {
            CachePolicy::ReferenceData
        }
    }
}

/// Identifies one lesson, the logical slot a video job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub course_id: u64,
    pub module_number: u32,
    pub lesson_index: u32,
}

impl SlotKey {
    pub fn new(course_id: u64, module_number: u32, lesson_index: u32) -> Self {
        Self {
            course_id,
            module_number,
            lesson_index,
        }
    }

    pub fn status_key(&self) -> String {
        format!("{}{}", STATUS_KEY_PREFIX, self.suffix())
    }

    pub fn content_key(&self) -> String {
        format!("{}{}", CONTENT_KEY_PREFIX, self.suffix())
    }

    fn suffix(&self) -> String {
        format!(
            "{}_{}_{}",
            self.course_id, self.module_number, self.lesson_index
        )
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.course_id, self.module_number, self.lesson_index
        )
    }
}

impl FromStr for SlotKey {
    type Err = Error;

    /// Parses `course/module/lesson`, e.g. `12/3/0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidInput(format!("slot must be course/module/lesson, got {:?}", s));
        let mut parts = s.trim().split('/');
        let (Some(course), Some(module), Some(lesson), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        Ok(Self {
            course_id: course.parse().map_err(|_| invalid())?,
            module_number: module.parse().map_err(|_| invalid())?,
            lesson_index: lesson.parse().map_err(|_| invalid())?,
        })
    }
}

/// Last known state of the job attached to a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCacheRecord {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub result_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobCacheRecord {
    pub fn from_job(job: &Job, progress: u8) -> Self {
        Self {
            job_id: job.job_id.clone(),
            status: job.status.clone(),
            progress,
            result_url: job.result_url.clone(),
            error: job.error_message.clone(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    value: T,
    timestamp: DateTime<Utc>,
}

/// A fresh value together with the time it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub stored_at: DateTime<Utc>,
}

/// Typed JSON layer over a [`KeyValueStore`] with TTL checked on read.
#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn KeyValueStore>,
}

impl TtlCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), Error> {
        self.put_at(key, value, Utc::now()).await
    }

    pub async fn put_at<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let json = serde_json::to_string(&Envelope {
            value,
            timestamp: now,
        })
        .map_err(|source| Error::CacheFormat {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &json).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
        policy: CachePolicy,
    ) -> Result<Option<Cached<T>>, Error> {
        self.get_at(key, policy, Utc::now()).await
    }

    /// Returns the entry if younger than the policy's TTL at `now`.
    /// Stale and unreadable entries are evicted and reported as a miss.
    pub async fn get_at<T: DeserializeOwned>(
        &self,
        key: &str,
        policy: CachePolicy,
        now: DateTime<Utc>,
    ) -> Result<Option<Cached<T>>, Error> {
        let log = DEFAULT.new(o!(
            "function" => "cache::TtlCache::get",
            "key" => key.to_owned(),
        ));

        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };

        let envelope: Envelope<T> = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(log, "evicting unreadable entry"; "error" => %err);
                self.store.remove(key).await?;
                return Ok(None);
            }
        };

        if now.signed_duration_since(envelope.timestamp) >= policy.ttl() {
            debug!(log, "evicting stale entry"; "stored_at" => %envelope.timestamp);
            self.store.remove(key).await?;
            return Ok(None);
        }

        Ok(Some(Cached {
            value: envelope.value,
            stored_at: envelope.timestamp,
        }))
    }

    pub async fn remove(&self, key: &str) -> Result<(), Error> {
        self.store.remove(key).await
    }

    /// Evicts every stale entry, choosing the policy from the key.
    /// Returns the number of entries removed.
    pub async fn purge_stale(&self, now: DateTime<Utc>) -> Result<usize, Error> {
        let mut removed = 0;
        for key in self.store.keys().await? {
            let fresh = self
                .get_at::<serde_json::Value>(&key, CachePolicy::for_key(&key), now)
                .await?;
            if fresh.is_none() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub async fn save_job_record(&self, slot: &SlotKey, record: &JobCacheRecord) -> Result<(), Error> {
        self.put(&slot.status_key(), record).await
    }

    pub async fn load_job_record(
        &self,
        slot: &SlotKey,
    ) -> Result<Option<Cached<JobCacheRecord>>, Error> {
        self.get(&slot.status_key(), CachePolicy::Content).await
    }

    pub async fn save_lesson_content(&self, slot: &SlotKey, content: &str) -> Result<(), Error> {
        self.put(&slot.content_key(), &content).await
    }

    pub async fn load_lesson_content(&self, slot: &SlotKey) -> Result<Option<String>, Error> {
        Ok(self
            .get::<String>(&slot.content_key(), CachePolicy::Content)
            .await?
            .map(|cached| cached.value))
    }
}
