//! Threading module for two-phase reads
//!
//! A [`ReadWorker`] owns one thread that serves read requests for a single
//! stream. `start` hands a request over and returns at once, `finish` blocks
//! for the result. Issuing `start` on two workers before finishing either
//! lets both decodes run at the same time.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::error::{Error, Result};

/// Worker thread serving one read at a time
pub struct ReadWorker<Req, Resp> {
    /// Thread name, for logging
    name: String,

    /// Request sender (dropped on shutdown)
    request_tx: Option<Sender<Req>>,

    /// Result receiver
    result_rx: Receiver<Resp>,

    /// Worker thread
    handle: Option<JoinHandle<()>>,

    /// Whether a read was started and not yet finished
    pending: bool,
}

impl<Req, Resp> ReadWorker<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Spawn a worker running `job` for each request
    pub fn spawn<F>(name: impl Into<String>, job: F) -> Result<Self>
    where
        F: FnMut(Req) -> Resp + Send + 'static,
    {
        let name = name.into();
        let (request_tx, request_rx) = bounded(1);
        let (result_tx, result_rx) = bounded(1);

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || Self::worker_loop(request_rx, result_tx, job))?;

        log::debug!("Read worker {} spawned", name);

        Ok(Self {
            name,
            request_tx: Some(request_tx),
            result_rx,
            handle: Some(handle),
            pending: false,
        })
    }

    /// Hand a request to the worker thread
    pub fn start(&mut self, request: Req) -> Result<()> {
        assert!(
            !self.pending,
            "read worker {}: start while a read is in flight",
            self.name
        );

        // Counts as started even if the send fails; finish() reports the disconnect
        self.pending = true;
        let tx = self
            .request_tx
            .as_ref()
            .ok_or_else(|| Error::Channel(format!("{} shut down", self.name)))?;
        tx.send(request)?;
        Ok(())
    }

    /// Wait for the result of the read in flight
    pub fn finish(&mut self) -> Result<Resp> {
        assert!(
            self.pending,
            "read worker {}: finish without a started read",
            self.name
        );
        self.pending = false;
        Ok(self.result_rx.recv()?)
    }

    /// Check if a read is in flight
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Get thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn worker_loop<F>(request_rx: Receiver<Req>, result_tx: Sender<Resp>, mut job: F)
    where
        F: FnMut(Req) -> Resp,
    {
        // Ends when the owning ReadWorker drops its sender
        for request in request_rx.iter() {
            if result_tx.send(job(request)).is_err() {
                break;
            }
        }
    }
}

impl<Req, Resp> Drop for ReadWorker<Req, Resp> {
    fn drop(&mut self) {
        self.request_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        log::debug!("Read worker {} stopped", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::time::Duration;

    #[test]
    fn test_start_finish() {
        let mut worker = ReadWorker::spawn("double", |x: u32| x * 2).unwrap();
        assert!(!worker.is_pending());

        worker.start(21).unwrap();
        assert!(worker.is_pending());
        assert_eq!(worker.finish().unwrap(), 42);
        assert!(!worker.is_pending());

        worker.start(5).unwrap();
        assert_eq!(worker.finish().unwrap(), 10);
    }

    #[test]
    fn test_two_workers_run_concurrently() {
        // Each job waits for the other one; sequential execution would deadlock
        let barrier = Arc::new(Barrier::new(2));
        let b0 = barrier.clone();
        let b1 = barrier;
        let mut w0 = ReadWorker::spawn("view-0", move |x: u32| {
            b0.wait();
            x
        })
        .unwrap();
        let mut w1 = ReadWorker::spawn("view-1", move |x: u32| {
            b1.wait();
            x + 1
        })
        .unwrap();

        w0.start(10).unwrap();
        w1.start(20).unwrap();
        assert_eq!(w0.finish().unwrap(), 10);
        assert_eq!(w1.finish().unwrap(), 21);
    }

    #[test]
    fn test_drop_with_read_in_flight() {
        let mut worker = ReadWorker::spawn("slow", |x: u64| {
            std::thread::sleep(Duration::from_millis(20));
            x
        })
        .unwrap();
        worker.start(1).unwrap();
        drop(worker);
    }

    #[test]
    #[should_panic(expected = "finish without a started read")]
    fn test_finish_without_start() {
        let mut worker = ReadWorker::spawn("idle", |x: u8| x).unwrap();
        let _ = worker.finish();
    }

    #[test]
    #[should_panic(expected = "start while a read is in flight")]
    fn test_double_start() {
        let mut worker = ReadWorker::spawn("busy", |x: u8| x).unwrap();
        worker.start(1).unwrap();
        let _ = worker.start(2);
    }
}
