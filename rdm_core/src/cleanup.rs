//! Process-global temp-directory cleanup queue — §5 "Resource discipline".
//!
//! A single task drains a bounded MPSC queue and retries deletion up to 5
//! times with 1-second backoff, logging on final failure. Every Runner
//! invocation posts its temp dir here exactly once, whether it exited
//! cleanly or not.

use std::path::PathBuf;

use tokio::sync::mpsc;

const QUEUE_CAPACITY: usize = 5;
const MAX_ATTEMPTS: u32 = 5;
const RETRY_BACKOFF: std::time::Duration = std::time::Duration::from_secs(1);

#[derive(Clone)]
pub struct CleanupQueue {
    tx: mpsc::Sender<PathBuf>,
}

impl CleanupQueue {
    /// Spawn the draining task and return a handle for posting directories.
    pub fn start() -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(drain(rx));
        Self { tx }
    }

    /// Post `dir` for eventual removal. Never blocks the caller beyond the
    /// channel's backpressure — cleanup is best-effort and asynchronous.
    pub async fn enqueue(&self, dir: PathBuf) {
        if self.tx.send(dir).await.is_err() {
            log::warn!("cleanup queue closed, dropping pending directory removal");
        }
    }
}

async fn drain(mut rx: mpsc::Receiver<PathBuf>) {
    while let Some(dir) = rx.recv().await {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => break,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => break,
                Err(e) if attempt < MAX_ATTEMPTS => {
                    log::debug!(
                        "cleanup attempt {attempt}/{MAX_ATTEMPTS} failed for {}: {e}",
                        dir.display()
                    );
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(e) => {
                    log::error!(
                        "giving up cleaning up {} after {MAX_ATTEMPTS} attempts: {e}",
                        dir.display()
                    );
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn removes_posted_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("job-dir");
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let queue = CleanupQueue::start();
        queue.enqueue(dir.clone()).await;

        // Give the drain task a moment to run.
        for _ in 0..50 {
            if !dir.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(!dir.exists());
    }
}
