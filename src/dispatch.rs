/// Asynchronous message dispatch.
///
/// Lifecycle operations enqueue a job and return immediately; a spawned
/// worker drains the queue and delivers with capped exponential backoff
/// (base 2 s, cap 600 s, 5 attempts). Exhausted retries are logged, never
/// surfaced to the original caller.
///
/// Two variants exist: `Queue` (worker-backed) and `Noop` (logs and drops)
/// for environments without a mail relay. Which one the application gets
/// is decided once, at startup.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::email_client::EmailClient;
use crate::error::DispatchError;

const MAX_ATTEMPTS: u32 = 5;
const BACKOFF_BASE_SECS: u64 = 2;
const BACKOFF_CAP_SECS: u64 = 600;

/// A unit of outbound work.
#[derive(Debug, Clone)]
pub enum Job {
    Email {
        to: String,
        subject: String,
        body: String,
    },
    Sms {
        phone: String,
        body: String,
    },
}

/// Handle used by request handlers to enqueue jobs.
#[derive(Clone)]
pub enum Dispatcher {
    Queue(mpsc::UnboundedSender<Job>),
    Noop,
}

impl Dispatcher {
    /// Spawn the delivery worker and return the queue-backed handle.
    pub fn spawn(email_client: EmailClient) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(worker(rx, email_client));
        Dispatcher::Queue(tx)
    }

    /// Dispatcher that accepts every job and delivers none.
    pub fn noop() -> Self {
        Dispatcher::Noop
    }

    /// Enqueue a job, best-effort. A full or closed queue is logged and
    /// swallowed; the calling operation proceeds regardless.
    pub fn enqueue(&self, job: Job) {
        match self {
            Dispatcher::Queue(tx) => {
                if tx.send(job).is_err() {
                    tracing::error!("dispatch queue closed; dropping job");
                }
            }
            Dispatcher::Noop => {
                tracing::debug!(?job, "no dispatcher configured; dropping job");
            }
        }
    }
}

async fn worker(mut rx: mpsc::UnboundedReceiver<Job>, email_client: EmailClient) {
    while let Some(job) = rx.recv().await {
        deliver_with_retry(&email_client, job).await;
    }
    tracing::info!("dispatch worker shutting down");
}

async fn deliver_with_retry(email_client: &EmailClient, job: Job) {
    for attempt in 1..=MAX_ATTEMPTS {
        match deliver(email_client, &job).await {
            Ok(()) => return,
            Err(e) => {
                if attempt == MAX_ATTEMPTS {
                    tracing::error!(attempt, error = %e, "delivery failed; retries exhausted");
                    return;
                }
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    attempt,
                    retry_in_secs = delay.as_secs(),
                    error = %e,
                    "delivery failed; will retry"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

async fn deliver(email_client: &EmailClient, job: &Job) -> Result<(), DispatchError> {
    match job {
        Job::Email { to, subject, body } => email_client.send_email(to, subject, body).await,
        Job::Sms { phone, .. } => {
            // no SMS provider wired up; deliberately a logged no-op
            tracing::debug!(phone = %phone, "no SMS provider configured; skipping send");
            Ok(())
        }
    }
}

/// Delay before the next attempt: 2^attempt seconds, capped.
fn backoff_delay(attempt: u32) -> Duration {
    let secs = BACKOFF_BASE_SECS
        .saturating_pow(attempt)
        .min(BACKOFF_CAP_SECS);
    Duration::from_secs(secs)
}
