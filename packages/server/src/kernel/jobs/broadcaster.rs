//! Fan-out of job events to live subscribers.
//!
//! Each subscriber owns a bounded channel; the broadcaster keeps the send
//! ends on the job record and hands the receive end back as a
//! [`Subscription`]. Delivery never blocks: a subscriber whose channel is
//! full or closed is dropped from the job.
//!
//! # Ordering
//!
//! A new subscriber receives, atomically with respect to publishing, a
//! `started` snapshot followed by one `page-complete` per result recorded so
//! far. Each subscriber remembers the next page index it is owed, so a live
//! `page-complete` already covered by its replay is skipped instead of being
//! delivered twice.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::JobError;
use super::events::JobEvent;
use super::job::BatchJob;
use super::job_store::JobStore;

/// Send end of one observer's channel.
#[derive(Debug)]
pub struct Subscriber {
    id: Uuid,
    sender: mpsc::Sender<JobEvent>,
    next_page: usize,
}

impl Subscriber {
    /// Deliver `event`; returns `false` when the subscriber should be removed.
    fn deliver(&mut self, job_id: Uuid, event: &JobEvent) -> bool {
        if let Some(index) = event.page_index() {
            if index < self.next_page {
                return true;
            }
        }
        match self.sender.try_send(event.clone()) {
            Ok(()) => {
                if let Some(index) = event.page_index() {
                    self.next_page = index + 1;
                }
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(%job_id, subscriber_id = %self.id, "Subscriber buffer full, detaching");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(%job_id, subscriber_id = %self.id, "Subscriber disconnected");
                false
            }
        }
    }
}

#[derive(Clone)]
pub struct EventBroadcaster {
    store: JobStore,
    buffer: usize,
}

impl EventBroadcaster {
    /// `buffer` is the minimum per-subscriber channel capacity.
    pub fn new(store: JobStore, buffer: usize) -> Self {
        Self {
            store,
            buffer: buffer.max(1),
        }
    }

    /// Attach a new observer to `job_id`, replaying what already happened.
    ///
    /// For a finished job the replay ends with the terminal event and the
    /// observer is never registered.
    pub fn subscribe(&self, job_id: Uuid) -> Result<Subscription, JobError> {
        let (subscriber_id, receiver) = self
            .store
            .with_job(job_id, |job| self.attach(job))
            .ok_or(JobError::NotFound(job_id))?;

        Ok(Subscription {
            job_id,
            subscriber_id,
            receiver,
            broadcaster: self.clone(),
        })
    }

    fn attach(&self, job: &mut BatchJob) -> (Uuid, mpsc::Receiver<JobEvent>) {
        // Room for the whole replay plus the terminal event
        let capacity = self.buffer.max(job.total() + 2);
        let (sender, receiver) = mpsc::channel(capacity);
        let mut subscriber = Subscriber {
            id: Uuid::new_v4(),
            sender,
            next_page: 0,
        };

        subscriber.deliver(job.id, &job.started_event());
        for (index, result) in job.completed.iter().enumerate() {
            let replay = JobEvent::PageComplete {
                job_id: job.id,
                index,
                result: result.clone(),
            };
            subscriber.deliver(job.id, &replay);
        }

        let subscriber_id = subscriber.id;
        if job.is_finished() {
            subscriber.deliver(job.id, &job.finished_event());
            debug!(job_id = %job.id, %subscriber_id, "Replayed finished job");
        } else {
            info!(
                job_id = %job.id,
                %subscriber_id,
                replayed = job.completed.len(),
                "Subscriber attached"
            );
            job.subscribers.push(subscriber);
        }
        (subscriber_id, receiver)
    }

    /// Send `event` to every attached observer of `job_id`.
    ///
    /// Returns the number of observers still attached afterwards.
    pub fn publish(&self, job_id: Uuid, event: &JobEvent) -> usize {
        self.store
            .with_job(job_id, |job| {
                job.subscribers.retain_mut(|sub| sub.deliver(job_id, event));
                job.subscribers.len()
            })
            .unwrap_or(0)
    }

    /// Remove one observer. Returns whether it was attached.
    pub fn detach(&self, job_id: Uuid, subscriber_id: Uuid) -> bool {
        self.store
            .with_job(job_id, |job| {
                let before = job.subscribers.len();
                job.subscribers.retain(|sub| sub.id != subscriber_id);
                before != job.subscribers.len()
            })
            .unwrap_or(false)
    }

    /// Send the terminal event, then close every observer's channel.
    pub fn finish(&self, job_id: Uuid, event: &JobEvent) {
        let closed = self.store.with_job(job_id, |job| {
            let subscribers = std::mem::take(&mut job.subscribers);
            let count = subscribers.len();
            for mut sub in subscribers {
                sub.deliver(job_id, event);
            }
            count
        });
        if let Some(count) = closed {
            info!(%job_id, subscribers = count, "Closed job event streams");
        }
    }

    pub fn subscriber_count(&self, job_id: Uuid) -> usize {
        self.store
            .read_job(job_id, BatchJob::subscriber_count)
            .unwrap_or(0)
    }
}

/// Receive end of a job event stream.
///
/// Dropping it detaches the observer.
pub struct Subscription {
    job_id: Uuid,
    subscriber_id: Uuid,
    receiver: mpsc::Receiver<JobEvent>,
    broadcaster: EventBroadcaster,
}

impl Subscription {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn id(&self) -> Uuid {
        self.subscriber_id
    }

    /// Next event, or `None` once the stream is closed.
    pub async fn recv(&mut self) -> Option<JobEvent> {
        self.receiver.recv().await
    }
}

impl Stream for Subscription {
    type Item = JobEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<JobEvent>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.broadcaster.detach(self.job_id, self.subscriber_id) {
            debug!(job_id = %self.job_id, subscriber_id = %self.subscriber_id, "Subscriber detached");
        }
    }
}
