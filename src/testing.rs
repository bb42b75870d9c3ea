//! Test doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::error::FetchError;
use crate::models::{Page, PageLinks, RemoteAuthor, RemoteRecord};
use crate::remote::PageFetcher;

pub fn remote(id: &str, username: &str, name: &str, code: &str) -> RemoteRecord {
    RemoteRecord {
        id: id.to_string(),
        name: name.to_string(),
        author: RemoteAuthor {
            username: username.to_string(),
        },
        code: code.to_string(),
    }
}

pub fn page(data: Vec<RemoteRecord>, next: Option<&str>) -> Page {
    Page {
        data,
        links: PageLinks {
            next: next.map(str::to_string),
        },
    }
}

#[derive(Clone)]
enum Scripted {
    Ok(Page),
    Fail,
}

/// [`PageFetcher`] that replays queued responses per URL.
///
/// The last queued response for a URL repeats once the queue drains, so a
/// single `fail` makes a page fail forever. Optionally every fetch waits on
/// a gate that the test opens with [`release`](ScriptedFetcher::release).
pub struct ScriptedFetcher {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
    in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Every fetch blocks until a permit is released.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn ok(&self, url: &str, page: Page) {
        self.push(url, Scripted::Ok(page));
    }

    pub fn fail(&self, url: &str) {
        self.push(url, Scripted::Fail);
    }

    fn push(&self, url: &str, response: Scripted) {
        self.script
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Fetches currently waiting at the gate or executing.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn next_response(&self, url: &str) -> Scripted {
        let mut script = self.script.lock().unwrap();
        let queue = script
            .get_mut(url)
            .unwrap_or_else(|| panic!("no response scripted for {}", url));
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(&self, url: &str) -> Result<Page, FetchError> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(url.to_string());

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let response = self.next_response(url);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match response {
            Scripted::Ok(page) => Ok(page),
            Scripted::Fail => Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            }),
        }
    }
}
