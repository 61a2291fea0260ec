//! Background request execution for the interactive console
//!
//! The console's event loop never blocks on the network. Requests run on a
//! small tokio runtime; each result comes back as a [`Completion`] that the
//! loop drains once per tick. Stale completions are filtered out by the
//! [`RequestSequencer`].

use std::future::Future;
use std::hash::Hash;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crate::error::{Error, Result};

use super::sequence::{RequestSequencer, Ticket};
use super::ConsoleApi;

/// Result of one submitted job.
#[derive(Debug)]
pub struct Completion<K, M> {
    pub key: K,
    pub ticket: Ticket,
    pub outcome: M,
}

pub struct Dispatcher<K, M> {
    runtime: tokio::runtime::Runtime,
    api: Arc<dyn ConsoleApi>,
    sequencer: RequestSequencer<K>,
    tx: Sender<Completion<K, M>>,
    rx: Receiver<Completion<K, M>>,
    in_flight: usize,
}

impl<K, M> Dispatcher<K, M>
where
    K: Eq + Hash + Copy + Send + std::fmt::Debug + 'static,
    M: Send + 'static,
{
    pub fn new(api: Arc<dyn ConsoleApi>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("logdesk-api")
            .enable_all()
            .build()
            .map_err(|e| Error::Runtime(format!("failed to create runtime: {}", e)))?;

        let (tx, rx) = mpsc::channel();
        Ok(Self {
            runtime,
            api,
            sequencer: RequestSequencer::new(),
            tx,
            rx,
            in_flight: 0,
        })
    }

    pub fn api(&self) -> Arc<dyn ConsoleApi> {
        Arc::clone(&self.api)
    }

    /// Start a job for `key`. Any earlier job for the same key becomes stale.
    pub fn submit<F, Fut>(&mut self, key: K, job: F) -> Ticket
    where
        F: FnOnce(Arc<dyn ConsoleApi>) -> Fut,
        Fut: Future<Output = M> + Send + 'static,
    {
        let ticket = self.sequencer.issue(key);
        let future = job(self.api());
        let tx = self.tx.clone();

        self.runtime.spawn(async move {
            let outcome = future.await;
            // The receiver only goes away at shutdown.
            let _ = tx.send(Completion {
                key,
                ticket,
                outcome,
            });
        });
        self.in_flight += 1;
        ticket
    }

    /// Collect finished jobs without blocking, dropping stale ones.
    pub fn drain(&mut self) -> Vec<Completion<K, M>> {
        let mut ready = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            if self.sequencer.accept(completion.key, completion.ticket) {
                ready.push(completion);
            }
        }
        ready
    }

    /// Block until the next completion arrives. Used by tests and shutdown.
    pub fn wait(&mut self, timeout: std::time::Duration) -> Option<Completion<K, M>> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            let completion = self.rx.recv_timeout(remaining).ok()?;
            self.in_flight = self.in_flight.saturating_sub(1);
            if self.sequencer.accept(completion.key, completion.ticket) {
                return Some(completion);
            }
        }
    }

    /// Drop whatever is outstanding for `key`.
    pub fn cancel(&mut self, key: K) {
        self.sequencer.invalidate(key);
    }

    pub fn is_loading(&self, key: K) -> bool {
        self.sequencer.is_pending(key)
    }

    /// Jobs submitted but not yet delivered, stale ones included.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubApi;
    use crate::types::{LogEntry, LogQuery};
    use std::time::Duration;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Key {
        Logs,
        Kb,
    }

    fn stub() -> Arc<dyn ConsoleApi> {
        Arc::new(StubApi {
            logs: vec![LogEntry {
                log_id: Some(1),
                ..Default::default()
            }],
            ..Default::default()
        })
    }

    #[test]
    fn test_completion_delivered() {
        let mut dispatcher: Dispatcher<Key, Result<usize>> = Dispatcher::new(stub()).unwrap();
        dispatcher.submit(Key::Logs, |api| async move {
            api.search_logs(&LogQuery::default())
                .await
                .map(|page| page.content.len())
        });
        assert!(dispatcher.is_loading(Key::Logs));

        let completion = dispatcher.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(completion.key, Key::Logs);
        assert_eq!(completion.outcome.unwrap(), 1);
        assert!(!dispatcher.is_loading(Key::Logs));
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[test]
    fn test_superseded_job_is_dropped() {
        let mut dispatcher: Dispatcher<Key, &'static str> = Dispatcher::new(stub()).unwrap();
        dispatcher.submit(Key::Logs, |_| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            "old"
        });
        dispatcher.submit(Key::Logs, |_| async { "new" });
        dispatcher.submit(Key::Kb, |_| async { "kb" });

        let mut seen = Vec::new();
        while let Some(c) = dispatcher.wait(Duration::from_millis(500)) {
            seen.push(c.outcome);
        }
        seen.sort();
        assert_eq!(seen, vec!["kb", "new"]);
    }

    #[test]
    fn test_cancelled_job_is_dropped() {
        let mut dispatcher: Dispatcher<Key, ()> = Dispatcher::new(stub()).unwrap();
        dispatcher.submit(Key::Kb, |_| async {});
        dispatcher.cancel(Key::Kb);
        assert!(dispatcher.wait(Duration::from_millis(200)).is_none());
    }
}
