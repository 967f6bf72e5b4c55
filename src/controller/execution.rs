//! Sequential replay: copy a list's items to the clipboard one per tick.
//!
//! The controller owns a single session slot. The host loop drives the
//! repeating timer by calling [`ListController::poll_execution`] and may
//! sleep until [`ListController::next_execution_deadline`].

use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::clipboard::Clipboard;
use crate::error::{ListError, ListResult};
use crate::events::ListEvent;
use crate::models::Item;
use crate::store::ListStore;

use super::ListController;

pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(500);

/// Fixed-interval deadline. Missed ticks are not replayed: firing re-arms
/// relative to the moment the tick was handled.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RepeatingTimer {
    interval: Duration,
    next_due: Instant,
}

impl RepeatingTimer {
    fn start(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now + interval,
        }
    }

    fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    fn rearm(&mut self, now: Instant) {
        self.next_due = now + self.interval;
    }
}

pub(crate) struct ExecutionSession {
    list_id: i64,
    list_name: String,
    items: Vec<Item>,
    cursor: usize,
    timer: Option<RepeatingTimer>,
}

/// Snapshot of a running replay for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionProgress {
    pub list_id: i64,
    pub list_name: String,
    /// Steps already copied.
    pub completed: usize,
    pub total: usize,
}

enum StepOutcome {
    Copied { finished: bool },
    Failed,
    Exhausted,
}

impl<S: ListStore, C: Clipboard> ListController<S, C> {
    /// Start replaying `list_id`, one item every `delay`. The first item is
    /// copied before this returns. Any running replay is cancelled first.
    pub fn execute_list_sequentially(&mut self, list_id: i64, delay: Duration) -> ListResult<()> {
        self.execute_list_sequentially_at(list_id, delay, Instant::now())
    }

    /// Same as [`Self::execute_list_sequentially`] with an explicit start
    /// instant; the first tick is due at `now + delay`.
    pub fn execute_list_sequentially_at(
        &mut self,
        list_id: i64,
        delay: Duration,
        now: Instant,
    ) -> ListResult<()> {
        let lista = match self.store.get_lista(list_id) {
            Ok(Some(lista)) => lista,
            Ok(None) => return self.fail(ListError::NotFound(list_id)),
            Err(source) => return self.fail(ListError::store("ejecutar lista")(source)),
        };

        let items = self.get_list_items(list_id);
        if items.is_empty() {
            return self.fail(ListError::EmptyList);
        }

        self.cancel_execution();

        let total_items = items.len();
        self.session = Some(ExecutionSession {
            list_id,
            list_name: lista.name.clone(),
            items,
            cursor: 0,
            timer: None,
        });

        self.events.publish(ListEvent::ExecutionStarted {
            list_id,
            total_items,
        });
        info!(
            list_id,
            name = %lista.name,
            steps = total_items,
            delay_ms = delay.as_millis() as u64,
            "sequential execution started"
        );
        self.record_use(list_id);

        self.execute_next_step();

        if let Some(session) = self.session.as_mut() {
            session.timer = Some(RepeatingTimer::start(delay, now));
        }
        Ok(())
    }

    /// Fire the timer if it is due at `now`. Returns whether a tick ran.
    pub fn poll_execution(&mut self, now: Instant) -> bool {
        let fired = match self.session.as_mut().and_then(|s| s.timer.as_mut()) {
            Some(timer) if timer.is_due(now) => {
                timer.rearm(now);
                true
            }
            _ => false,
        };

        if fired {
            self.execute_next_step();
        }
        fired
    }

    /// When the next tick is due, if a replay is running.
    pub fn next_execution_deadline(&self) -> Option<Instant> {
        self.session
            .as_ref()
            .and_then(|s| s.timer.as_ref())
            .map(|timer| timer.next_due)
    }

    pub fn is_executing(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.timer.is_some())
    }

    pub fn execution_progress(&self) -> Option<ExecutionProgress> {
        self.session.as_ref().map(|session| ExecutionProgress {
            list_id: session.list_id,
            list_name: session.list_name.clone(),
            completed: session.cursor,
            total: session.items.len(),
        })
    }

    /// Stop the running replay. Does nothing when idle.
    pub fn cancel_execution(&mut self) {
        if !self.is_executing() {
            return;
        }
        if let Some(session) = self.session.take() {
            info!(
                list_id = session.list_id,
                name = %session.list_name,
                completed = session.cursor,
                "sequential execution cancelled"
            );
            self.events.publish(ListEvent::ExecutionCancelled);
        }
    }

    fn execute_next_step(&mut self) {
        let outcome = match self.session.as_mut() {
            None => return,
            Some(session) => match session.items.get(session.cursor) {
                None => StepOutcome::Exhausted,
                Some(item) => {
                    let step = session.cursor + 1;
                    let total = session.items.len();
                    match self.clipboard.copy_text(&item.content) {
                        Ok(()) => {
                            debug!(step, total, label = %item.label, "step executed");
                            self.events.publish(ListEvent::ExecutionStep {
                                step,
                                label: item.label.clone(),
                            });
                            session.cursor = step;
                            StepOutcome::Copied {
                                finished: step >= total,
                            }
                        }
                        Err(err) => {
                            error!(step, error = %format!("{err:#}"), "step failed, aborting execution");
                            StepOutcome::Failed
                        }
                    }
                }
            },
        };

        match outcome {
            StepOutcome::Copied { finished: false } => {}
            StepOutcome::Copied { finished: true } | StepOutcome::Failed | StepOutcome::Exhausted => {
                self.finish_execution()
            }
        }
    }

    fn finish_execution(&mut self) {
        if let Some(session) = self.session.take() {
            info!(
                list_id = session.list_id,
                name = %session.list_name,
                "sequential execution completed"
            );
            self.events.publish(ListEvent::ExecutionCompleted {
                list_id: session.list_id,
            });
        }
    }
}

#[cfg(test)]
mod timer_tests {
    use super::*;

    #[test]
    fn timer_rearms_from_handling_time() {
        let t0 = Instant::now();
        let mut timer = RepeatingTimer::start(Duration::from_millis(100), t0);
        assert!(!timer.is_due(t0 + Duration::from_millis(99)));
        assert!(timer.is_due(t0 + Duration::from_millis(100)));

        // Handled late: the next tick is one interval after handling.
        timer.rearm(t0 + Duration::from_millis(250));
        assert!(!timer.is_due(t0 + Duration::from_millis(300)));
        assert!(timer.is_due(t0 + Duration::from_millis(350)));
    }
}
