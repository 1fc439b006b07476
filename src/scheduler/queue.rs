//! Time-ordered event delivery
//!
//! Any task may schedule; one consumer drains. Due events are delivered in
//! fire-time order with FIFO tie-break to a single registered callback. A
//! callback error is logged and never halts delivery of later events;
//! failed events are not retried.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::time::Instant;

use crate::core::error::Result;
use crate::scheduler::event::{Event, EvaluationPolicy};
use crate::world::WorldContext;

/// The processing callback receiving due events
pub type EventCallback = Arc<dyn Fn(&WorldContext, Event) -> Result<()> + Send + Sync>;

struct Scheduled {
    fire_at: Instant,
    /// Insertion sequence, the FIFO tie-break
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap: earliest fire time first, then
        // insertion order.
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct SchedulerState {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

/// Priority queue of events plus its consumer machinery
pub struct EventScheduler {
    state: Mutex<SchedulerState>,
    wake: Notify,
    callback: Mutex<EventCallback>,
}

impl EventScheduler {
    /// Scheduler whose default callback runs the event state machine
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SchedulerState::default()),
            wake: Notify::new(),
            callback: Mutex::new(Arc::new(|ctx: &WorldContext, event: Event| {
                event.run(ctx);
                Ok(())
            })),
        }
    }

    /// Replace the processing callback (tests, instrumentation)
    pub fn register_callback(&self, callback: EventCallback) {
        *self.callback.lock().unwrap() = callback;
    }

    /// Admit an event to fire after `delay`
    ///
    /// Returns false, without admitting, when the policy gates scheduling
    /// and the conditions fail.
    pub fn schedule(&self, ctx: &WorldContext, event: Event, delay: Duration) -> bool {
        if matches!(
            event.policy,
            EvaluationPolicy::OnSchedule | EvaluationPolicy::OnBoth
        ) && !event.conditions_pass(ctx)
        {
            tracing::trace!(event = event.id.0, "rejected at schedule time");
            return false;
        }
        let mut state = self.state.lock().unwrap();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(Scheduled {
            fire_at: Instant::now() + delay,
            seq,
            event,
        });
        drop(state);
        self.wake.notify_one();
        true
    }

    pub fn schedule_immediate(&self, ctx: &WorldContext, event: Event) -> bool {
        self.schedule(ctx, event, Duration::ZERO)
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().unwrap().heap.len()
    }

    fn pop_due(&self, now: Instant) -> Option<Event> {
        let mut state = self.state.lock().unwrap();
        if state.heap.peek()?.fire_at <= now {
            Some(state.heap.pop().expect("peeked entry").event)
        } else {
            None
        }
    }

    fn next_fire_time(&self) -> Option<Instant> {
        self.state.lock().unwrap().heap.peek().map(|s| s.fire_at)
    }

    /// Drain one batch of due events right now (tests, manual pumping)
    pub fn pump(&self, ctx: &WorldContext) -> usize {
        let now = Instant::now();
        let mut delivered = 0;
        while let Some(event) = self.pop_due(now) {
            self.deliver(ctx, event);
            delivered += 1;
        }
        delivered
    }

    fn deliver(&self, ctx: &WorldContext, event: Event) {
        let callback = Arc::clone(&*self.callback.lock().unwrap());
        let id = event.id;
        if let Err(error) = callback(ctx, event) {
            tracing::warn!(event = id.0, %error, "event callback failed");
        }
    }

    /// Consumer loop: sleeps until the earliest pending fire time, wakes on
    /// new work, drains everything due
    pub async fn run(
        self: Arc<Self>,
        ctx: Arc<WorldContext>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            if *shutdown.borrow() {
                break;
            }
            let now = Instant::now();
            while let Some(event) = self.pop_due(now) {
                self.deliver(&ctx, event);
            }

            let next = self.next_fire_time();
            tokio::select! {
                _ = shutdown.changed() => {}
                _ = self.wake.notified() => {}
                _ = async {
                    match next {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                } => {}
            }
        }
        tracing::debug!("event scheduler stopped");
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}
