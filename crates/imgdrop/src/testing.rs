//! In-process [`ImageService`] fake for component tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use tokio::sync::Notify;

use crate::error::{Error, Result};
use crate::model::ImageListing;
use crate::service::{ImageService, ServiceReply, UploadFile};

type ScriptedUpload = (Option<Arc<Notify>>, Result<ServiceReply>);

/// Replays queued replies in order.
#[derive(Debug, Default)]
pub struct ScriptedService {
    uploads: Mutex<VecDeque<ScriptedUpload>>,
    listings: Mutex<VecDeque<Result<Vec<ImageListing>>>>,
    uploaded: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
}

impl ScriptedService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a JSON reply for the next upload.
    pub fn push_upload(&self, status: u16, body: &str) {
        self.push(None, Ok(reply(status, body)));
    }

    /// Queue an upload failure.
    pub fn push_upload_error(&self, err: Error) {
        self.push(None, Err(err));
    }

    /// Queue a reply that is held back until the returned gate is notified.
    pub fn push_gated_upload(&self, status: u16, body: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(Some(Arc::clone(&gate)), Ok(reply(status, body)));
        gate
    }

    /// Queue a listing result.
    pub fn push_listing(&self, listing: Result<Vec<ImageListing>>) {
        lock(&self.listings).push_back(listing);
    }

    /// Names of every file uploaded so far.
    pub fn uploaded(&self) -> Vec<String> {
        lock(&self.uploaded).clone()
    }

    /// Number of `list_images` calls so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn push(&self, gate: Option<Arc<Notify>>, reply: Result<ServiceReply>) {
        lock(&self.uploads).push_back((gate, reply));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn reply(status: u16, body: &str) -> ServiceReply {
    ServiceReply {
        status,
        body: Bytes::from(body.to_string()),
    }
}

/// `count` listings named `1.jpg`, `2.jpg`, ...
pub fn listings(count: usize) -> Vec<ImageListing> {
    (1..=count)
        .map(|i| ImageListing::new(format!("{i}.jpg"), format!("/download/{i}.jpg")))
        .collect()
}

#[async_trait::async_trait]
impl ImageService for ScriptedService {
    async fn upload(&self, file: &UploadFile) -> Result<ServiceReply> {
        lock(&self.uploaded).push(file.name.clone());
        let next = lock(&self.uploads).pop_front();
        let (gate, reply) = next.ok_or_else(|| Error::internal("no scripted upload reply"))?;
        if let Some(gate) = gate {
            gate.notified().await;
        }
        reply
    }

    async fn list_images(&self) -> Result<Vec<ImageListing>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.listings)
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn welcome(&self) -> Result<String> {
        Ok("Welcome to Image Manipulation Server".to_string())
    }

    async fn download(&self, url: &str) -> Result<Bytes> {
        Err(Error::status(404, &format!("no scripted download for {url}")))
    }
}
