//! Interval refresh of a [`BoardSession`] from the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use laneboard_core::ErrorKind;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::BoardApi;
use crate::session::{BoardSession, MergeOutcome, SkipReason};

/// Result of a single poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    Applied,
    Unchanged,
    /// The fetch completed but its result was thrown away.
    Discarded(MergeOutcome),
    FetchFailed(ErrorKind),
}

pub struct Poller<A> {
    api: Arc<A>,
    session: Arc<BoardSession>,
    interval: Duration,
    stopped: Arc<AtomicBool>,
}

impl<A: BoardApi + 'static> Poller<A> {
    pub fn new(api: Arc<A>, session: Arc<BoardSession>, interval: Duration) -> Self {
        Self {
            api,
            session,
            interval,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run one poll: gate, fetch, merge.
    ///
    /// A failed fetch leaves local state alone; the next tick tries again.
    pub async fn tick(&self) -> TickOutcome {
        let generation = match self.session.begin_poll() {
            Ok(g) => g,
            Err(reason) => {
                tracing::debug!(board = %self.session.board_id(), ?reason, "poll skipped");
                return TickOutcome::Skipped(reason);
            }
        };

        let fetched = self.api.fetch_snapshot(self.session.board_id()).await;
        if self.stopped.load(Ordering::SeqCst) {
            return TickOutcome::Discarded(MergeOutcome::Superseded);
        }

        let snapshot = match fetched {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(board = %self.session.board_id(), "poll failed: {e}");
                return TickOutcome::FetchFailed(e.kind());
            }
        };

        match self.session.merge_polled(snapshot, generation) {
            MergeOutcome::Applied => {
                tracing::debug!(board = %self.session.board_id(), "poll applied newer board");
                TickOutcome::Applied
            }
            MergeOutcome::Unchanged => TickOutcome::Unchanged,
            other => {
                tracing::debug!(board = %self.session.board_id(), ?other, "poll result discarded");
                TickOutcome::Discarded(other)
            }
        }
    }

    /// Start the background loop. Ticks that fall behind are skipped, not
    /// queued, so at most one fetch is outstanding.
    pub fn spawn(self) -> PollerHandle {
        let stopped = self.stopped.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; the session already
            // holds a fresh snapshot.
            interval.tick().await;
            loop {
                interval.tick().await;
                if self.stopped.load(Ordering::SeqCst) {
                    break;
                }
                self.tick().await;
            }
        });
        PollerHandle {
            stopped,
            task: Some(task),
        }
    }
}

/// Owns the polling task. Stopping or dropping it tears the loop down and
/// discards any fetch still in flight.
pub struct PollerHandle {
    stopped: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{board, ids, lane_ids, FakeApi};
    use laneboard_core::mutator::DragTarget;

    fn setup() -> (Arc<FakeApi>, Arc<BoardSession>, Poller<FakeApi>) {
        let api = Arc::new(FakeApi::new(board()));
        let session = Arc::new(BoardSession::new("demo", board()));
        let poller = Poller::new(api.clone(), session.clone(), Duration::from_millis(50));
        (api, session, poller)
    }

    fn move_y_to_done(api: &FakeApi) {
        api.edit(|b| {
            let mut items = b.items.clone();
            for i in items.iter_mut() {
                match i.id.as_str() {
                    "y" => {
                        i.lane_id = "done".into();
                        i.position = 0;
                    }
                    "z" => i.position = 1,
                    _ => {}
                }
            }
            *b = laneboard_core::board::BoardSnapshot::new(b.lanes.clone(), items);
        });
    }

    #[tokio::test]
    async fn unchanged_board_is_not_republished() {
        let (_api, session, poller) = setup();
        let held = session.snapshot();
        assert_eq!(poller.tick().await, TickOutcome::Unchanged);
        assert!(Arc::ptr_eq(&session.snapshot(), &held));
    }

    #[tokio::test]
    async fn newer_server_state_is_applied() {
        let (api, session, poller) = setup();
        move_y_to_done(&api);
        assert_eq!(poller.tick().await, TickOutcome::Applied);
        assert_eq!(lane_ids(&session.snapshot(), "done"), ids(&["y"]));
    }

    #[tokio::test]
    async fn tick_during_drag_does_not_fetch() {
        let (api, session, poller) = setup();
        session.drag_start("x");
        assert_eq!(
            poller.tick().await,
            TickOutcome::Skipped(SkipReason::Dragging)
        );
        assert_eq!(api.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn backgrounded_session_does_not_fetch() {
        let (api, session, poller) = setup();
        session.set_foreground(false);
        assert_eq!(
            poller.tick().await,
            TickOutcome::Skipped(SkipReason::Background)
        );
        assert_eq!(api.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetch_failure_keeps_local_state() {
        let (api, session, poller) = setup();
        api.fail_fetches.store(true, Ordering::SeqCst);
        let held = session.snapshot();
        assert_eq!(
            poller.tick().await,
            TickOutcome::FetchFailed(ErrorKind::TransientIo)
        );
        assert!(Arc::ptr_eq(&session.snapshot(), &held));
    }

    #[tokio::test]
    async fn poll_resolving_mid_drag_is_discarded_then_picked_up_later() {
        let (api, session, poller) = setup();
        let poller = Arc::new(poller);
        move_y_to_done(&api);
        let release = api.hold_next_fetch();

        let in_flight = tokio::spawn({
            let poller = poller.clone();
            async move { poller.tick().await }
        });
        while api.fetches.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // Drag begins while the fetch is outstanding.
        session.drag_start("x");
        session.drag_over(Some(&DragTarget::Item("z".into())));
        let dragged = session.snapshot();
        release.send(()).unwrap();

        assert_eq!(
            in_flight.await.unwrap(),
            TickOutcome::Discarded(MergeOutcome::Suspended)
        );
        assert!(Arc::ptr_eq(&session.snapshot(), &dragged));

        session.drag_cancel();
        assert_eq!(poller.tick().await, TickOutcome::Applied);
        assert_eq!(lane_ids(&session.snapshot(), "done"), ids(&["y"]));
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_loop_polls_until_stopped() {
        let (api, session, poller) = setup();
        let mut handle = poller.spawn();

        tokio::time::sleep(Duration::from_millis(175)).await;
        let polled = api.fetches.load(Ordering::SeqCst);
        assert!(polled >= 3, "polled {polled} times");

        move_y_to_done(&api);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(lane_ids(&session.snapshot(), "done"), ids(&["y"]));

        handle.stop();
        assert!(handle.is_stopped());
        let after_stop = api.fetches.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(api.fetches.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn fetch_resolving_after_stop_is_discarded() {
        let (api, session, poller) = setup();
        let poller = Arc::new(poller);
        move_y_to_done(&api);
        let held = session.snapshot();
        let release = api.hold_next_fetch();

        let in_flight = tokio::spawn({
            let poller = poller.clone();
            async move { poller.tick().await }
        });
        while api.fetches.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        poller.stopped.store(true, Ordering::SeqCst);
        release.send(()).unwrap();

        assert_eq!(
            in_flight.await.unwrap(),
            TickOutcome::Discarded(MergeOutcome::Superseded)
        );
        assert!(Arc::ptr_eq(&session.snapshot(), &held));
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_during_a_fetch_leaves_the_board_alone() {
        let (api, session, poller) = setup();
        let held = session.snapshot();
        // The held fetch reads the server before waiting, so edit first.
        move_y_to_done(&api);
        let release = api.hold_next_fetch();
        let mut handle = poller.spawn();

        while api.fetches.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.stop();
        // The aborted task may already have dropped the receiver.
        let _ = release.send(());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(Arc::ptr_eq(&session.snapshot(), &held));
        assert_eq!(api.fetches.load(Ordering::SeqCst), 1);
    }
}
