//! Avatar state machine with idle reversion.
//!
//! The machine owns the avatar's current [`AvatarState`]. Entering
//! `Active` arms an idle timer that synthesizes a `Timeout` trigger when it
//! elapses; any other transition disarms it. Listeners run synchronously,
//! in registration order, after the state has been updated and the internal
//! lock released.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tracing::debug;

use paperpal_common::sync::lock;
use paperpal_common::{schedule, AvatarState, ScheduledTask, Subscribers, Subscription};
use paperpal_config::PaperPalConfig;

use crate::transition::{next_state, TransitionTrigger};

/// Idle reversion delay used when none is configured.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Called with `(new_state, previous_state)` after every transition.
pub type StateListener = dyn Fn(AvatarState, AvatarState) + Send + Sync;

struct Inner {
    state: AvatarState,
    idle_timer: Option<ScheduledTask>,
    /// Bumped whenever the idle timer is cancelled or re-armed.
    timer_generation: u64,
}

impl Inner {
    fn cancel_idle_timer(&mut self) {
        self.timer_generation = self.timer_generation.wrapping_add(1);
        if let Some(mut timer) = self.idle_timer.take() {
            timer.cancel();
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    listeners: Subscribers<StateListener>,
    idle_timeout: Duration,
}

/// Cheaply cloneable handle to one avatar's state machine.
#[derive(Clone)]
pub struct AvatarStateMachine {
    shared: Arc<Shared>,
}

impl AvatarStateMachine {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: AvatarState::Idle,
                    idle_timer: None,
                    timer_generation: 0,
                }),
                listeners: Subscribers::new(),
                idle_timeout,
            }),
        }
    }

    pub fn from_config(config: &PaperPalConfig) -> Self {
        Self::new(Duration::from_millis(config.avatar.idle_timeout_ms))
    }

    pub fn state(&self) -> AvatarState {
        lock(&self.shared.inner).state
    }

    pub fn idle_timeout(&self) -> Duration {
        self.shared.idle_timeout
    }

    pub fn is_idle_timer_armed(&self) -> bool {
        lock(&self.shared.inner).idle_timer.is_some()
    }

    /// Apply `trigger` to the current state.
    ///
    /// Returns `false` and changes nothing when the pair is not in the
    /// transition table.
    pub fn transition(&self, trigger: TransitionTrigger) -> bool {
        let (previous, next) = {
            let mut inner = lock(&self.shared.inner);
            let previous = inner.state;
            let Some(next) = next_state(previous, trigger) else {
                debug!(state = %previous, ?trigger, "ignoring invalid avatar transition");
                return false;
            };

            inner.state = next;
            inner.cancel_idle_timer();
            if next == AvatarState::Active {
                self.arm_idle_timer(&mut inner);
            }
            (previous, next)
        };

        debug!(from = %previous, to = %next, ?trigger, "avatar transition");
        for listener in self.shared.listeners.snapshot() {
            listener(next, previous);
        }
        true
    }

    /// Restart the idle countdown. Only has an effect while `Active`.
    pub fn reset_idle_timer(&self) -> bool {
        let mut inner = lock(&self.shared.inner);
        if inner.state != AvatarState::Active {
            return false;
        }
        inner.cancel_idle_timer();
        self.arm_idle_timer(&mut inner);
        true
    }

    /// Overwrite the state without notifying listeners or arming a timer.
    ///
    /// Only for resynchronising with a state persisted elsewhere. A timer
    /// left over from a previous `Active` period is cancelled.
    pub fn force_state(&self, state: AvatarState) {
        let mut inner = lock(&self.shared.inner);
        inner.cancel_idle_timer();
        inner.state = state;
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(AvatarState, AvatarState) + Send + Sync + 'static,
    {
        self.shared.listeners.add(Arc::new(listener))
    }

    /// Cancel the idle timer and drop every listener.
    pub fn dispose(&self) {
        lock(&self.shared.inner).cancel_idle_timer();
        self.shared.listeners.clear();
    }

    fn arm_idle_timer(&self, inner: &mut Inner) {
        let generation = inner.timer_generation;
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        inner.idle_timer = Some(schedule(self.shared.idle_timeout, move || {
            if let Some(shared) = weak.upgrade() {
                AvatarStateMachine { shared }.on_idle_timeout(generation);
            }
        }));
    }

    fn on_idle_timeout(&self, generation: u64) {
        if lock(&self.shared.inner).timer_generation != generation {
            return;
        }
        debug!("idle timer elapsed");
        self.transition(TransitionTrigger::Timeout);
    }
}

impl Default for AvatarStateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use AvatarState::*;
    use TransitionTrigger::*;

    const STATES: [AvatarState; 3] = [Idle, Alert, Active];
    const TRIGGERS: [TransitionTrigger; 4] = [Click, NewPaper, Timeout, Dismiss];

    fn recorder(machine: &AvatarStateMachine) -> Arc<StdMutex<Vec<(AvatarState, AvatarState)>>> {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        machine.subscribe(move |new, old| sink.lock().unwrap().push((new, old)));
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn every_pair_follows_the_table() {
        for from in STATES {
            for trigger in TRIGGERS {
                let machine = AvatarStateMachine::default();
                machine.force_state(from);
                let seen = recorder(&machine);

                let applied = machine.transition(trigger);
                match next_state(from, trigger) {
                    Some(to) => {
                        assert!(applied, "{from:?} + {trigger:?}");
                        assert_eq!(machine.state(), to);
                        assert_eq!(*seen.lock().unwrap(), vec![(to, from)]);
                    }
                    None => {
                        assert!(!applied, "{from:?} + {trigger:?}");
                        assert_eq!(machine.state(), from);
                        assert!(seen.lock().unwrap().is_empty());
                    }
                }
                machine.dispose();
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn entering_active_arms_and_leaving_disarms() {
        let machine = AvatarStateMachine::default();
        assert!(!machine.is_idle_timer_armed());

        assert!(machine.transition(Click));
        assert!(machine.is_idle_timer_armed());

        assert!(machine.transition(Dismiss));
        assert!(!machine.is_idle_timer_armed());

        assert!(machine.transition(NewPaper));
        assert!(!machine.is_idle_timer_armed());

        assert!(machine.transition(Click));
        assert!(machine.is_idle_timer_armed());

        assert!(machine.transition(Timeout));
        assert!(!machine.is_idle_timer_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timer_reverts_active_to_idle() {
        let machine = AvatarStateMachine::new(Duration::from_millis(30_000));
        let seen = recorder(&machine);
        machine.transition(Click);

        tokio::time::sleep(Duration::from_millis(29_999)).await;
        assert_eq!(machine.state(), Active);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(machine.state(), Idle);
        assert!(!machine.is_idle_timer_armed());
        assert_eq!(*seen.lock().unwrap(), vec![(Active, Idle), (Idle, Active)]);
    }

    #[tokio::test(start_paused = true)]
    async fn new_paper_then_timeout_returns_to_idle() {
        let machine = AvatarStateMachine::default();
        assert!(machine.transition(NewPaper));
        assert_eq!(machine.state(), Alert);
        assert!(!machine.is_idle_timer_armed());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(machine.state(), Alert);

        assert!(machine.transition(Timeout));
        assert_eq!(machine.state(), Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_idle_timer_extends_active() {
        let machine = AvatarStateMachine::new(Duration::from_secs(10));
        machine.transition(Click);

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert!(machine.reset_idle_timer());

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(machine.state(), Active);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(machine.state(), Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_idle_timer_outside_active_is_noop() {
        let machine = AvatarStateMachine::default();
        assert!(!machine.reset_idle_timer());
        assert!(!machine.is_idle_timer_armed());

        machine.transition(NewPaper);
        assert!(!machine.reset_idle_timer());
        assert!(!machine.is_idle_timer_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires_late() {
        let machine = AvatarStateMachine::new(Duration::from_secs(5));
        let seen = recorder(&machine);

        machine.transition(Click);
        machine.transition(Dismiss);
        machine.transition(NewPaper);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(machine.state(), Alert);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn force_state_skips_listeners_and_timers() {
        let machine = AvatarStateMachine::default();
        let seen = recorder(&machine);

        machine.force_state(Active);
        assert_eq!(machine.state(), Active);
        assert!(!machine.is_idle_timer_armed());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn force_state_cancels_leftover_timer() {
        let machine = AvatarStateMachine::new(Duration::from_secs(5));
        machine.transition(Click);
        machine.force_state(Alert);
        assert!(!machine.is_idle_timer_armed());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(machine.state(), Alert);
    }

    #[tokio::test(start_paused = true)]
    async fn listeners_run_in_registration_order() {
        let machine = AvatarStateMachine::default();
        let order = Arc::new(StdMutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            machine.subscribe(move |_, _| order.lock().unwrap().push(tag));
        }

        machine.transition(NewPaper);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribe_is_idempotent() {
        let machine = AvatarStateMachine::default();
        let seen = Arc::new(StdMutex::new(0));
        let sink = Arc::clone(&seen);
        let handle = machine.subscribe(move |_, _| *sink.lock().unwrap() += 1);

        machine.transition(NewPaper);
        handle.unsubscribe();
        handle.unsubscribe();
        machine.transition(Dismiss);

        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn listener_may_trigger_another_transition() {
        let machine = AvatarStateMachine::default();
        let inner = machine.clone();
        machine.subscribe(move |new, _| {
            if new == Alert {
                inner.transition(Click);
            }
        });

        machine.transition(NewPaper);
        assert_eq!(machine.state(), Active);
        assert!(machine.is_idle_timer_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_cancels_timer_and_listeners() {
        let machine = AvatarStateMachine::new(Duration::from_secs(1));
        let seen = recorder(&machine);
        machine.transition(Click);

        machine.dispose();
        assert!(!machine.is_idle_timer_armed());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(machine.state(), Active);

        machine.transition(Dismiss);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn from_config_uses_idle_timeout() {
        let mut config = PaperPalConfig::default();
        config.avatar.idle_timeout_ms = 12_000;
        let machine = AvatarStateMachine::from_config(&config);
        assert_eq!(machine.idle_timeout(), Duration::from_secs(12));
        assert_eq!(machine.state(), Idle);
    }
}
