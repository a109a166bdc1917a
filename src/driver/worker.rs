//! Driver Worker
//!
//! Moves a driver onto its own blocking thread so that native calls never
//! stall the async runtime.
//!
//! ```text
//!  DriverHandle ──(Job)──> unbounded mpsc ──> spawn_blocking loop
//!       ▲                                          │
//!       │                                   driver.handle()
//!       └──────(DriverEvent stream per job)────────┘
//! ```
//!
//! Jobs run strictly one at a time in submission order. Interrupting only
//! raises the shared flag; the running `Execute` notices it before its
//! next line. When the last handle is dropped the queue closes, the worker
//! disconnects the driver and the thread exits.

use crate::backends::BackendType;
use crate::connection::InterruptFlag;
use crate::driver::events::{CommandResult, DriverEvent, EventSink, NullSink, Request, Response};
use crate::driver::local::BackendDriver;
use crate::error::{Error, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct Job {
    request: Request,
    events: mpsc::UnboundedSender<DriverEvent>,
}

/// Forwards events of one job to its channel.
///
/// Progress is clamped so that it never decreases.
struct ChannelSink {
    events: mpsc::UnboundedSender<DriverEvent>,
    last_progress: u8,
}

impl ChannelSink {
    fn send(&self, event: DriverEvent) {
        // The requester may have stopped listening
        let _ = self.events.send(event);
    }
}

impl EventSink for ChannelSink {
    fn progress(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent > self.last_progress {
            self.last_progress = percent;
            self.send(DriverEvent::Progress(percent));
        }
    }

    fn output(&mut self, result: CommandResult) {
        self.send(DriverEvent::Output(result));
    }
}

/// Everything a job produced, collected by [`DriverHandle::call`].
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub progress: Vec<u8>,
    pub outputs: Vec<CommandResult>,
    pub result: Result<Response>,
}

/// Cloneable handle to a driver running on a worker thread.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    jobs: mpsc::UnboundedSender<Job>,
    interrupt: InterruptFlag,
    backend: BackendType,
}

/// Starts a worker for `driver` on the tokio blocking pool.
///
/// Must be called from within a tokio runtime.
pub fn spawn_driver(driver: Box<dyn BackendDriver>) -> DriverHandle {
    let (jobs, mut queue) = mpsc::unbounded_channel::<Job>();
    let interrupt = driver.interrupt_flag();
    let backend = driver.backend();

    tokio::task::spawn_blocking(move || {
        let mut driver = driver;
        debug!(backend = %backend, "Driver worker started");

        while let Some(job) = queue.blocking_recv() {
            run_job(driver.as_mut(), job);
        }

        if driver.is_connected() {
            if let Err(e) = driver.handle(Request::Disconnect, &mut NullSink) {
                warn!(backend = %backend, error = %e, "Error disconnecting driver");
            }
        }
        info!(backend = %backend, "Driver worker stopped");
    });

    DriverHandle {
        jobs,
        interrupt,
        backend,
    }
}

fn run_job(driver: &mut dyn BackendDriver, job: Job) {
    let name = job.request.name();
    let mut sink = ChannelSink {
        events: job.events,
        last_progress: 0,
    };

    sink.send(DriverEvent::Progress(0));
    let result = driver.handle(job.request, &mut sink);
    sink.progress(100);

    match &result {
        Ok(_) => debug!(request = name, "Request finished"),
        Err(e) => debug!(request = name, error = %e, "Request failed"),
    }
    sink.send(DriverEvent::Finished(result));
}

impl DriverHandle {
    pub fn backend(&self) -> BackendType {
        self.backend
    }

    pub fn interrupt_flag(&self) -> &InterruptFlag {
        &self.interrupt
    }

    /// Asks the running `Execute` to stop before its next line.
    pub fn interrupt(&self) {
        self.interrupt.interrupt();
    }

    /// Queues a request and returns the stream of its events.
    pub fn submit(&self, request: Request) -> Result<mpsc::UnboundedReceiver<DriverEvent>> {
        let (events, receiver) = mpsc::unbounded_channel();
        self.jobs
            .send(Job { request, events })
            .map_err(|_| Error::ConnectionError("driver worker has stopped".to_string()))?;
        Ok(receiver)
    }

    /// Queues a request and waits for it to finish.
    pub async fn call(&self, request: Request) -> Result<Completion> {
        let mut receiver = self.submit(request)?;
        let mut progress = Vec::new();
        let mut outputs = Vec::new();

        while let Some(event) = receiver.recv().await {
            match event {
                DriverEvent::Progress(p) => progress.push(p),
                DriverEvent::Output(output) => outputs.push(output),
                DriverEvent::Finished(result) => {
                    return Ok(Completion {
                        progress,
                        outputs,
                        result,
                    })
                }
            }
        }

        Err(Error::ConnectionError(
            "driver worker stopped before finishing the request".to_string(),
        ))
    }
}
