use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::time::Instant;

use crate::models::landing_models::ViewState;
use crate::utils::timer::ScopedTimer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    SplashElapsed,
    BookRide { pickup: String, dropoff: String },
    ThankYouElapsed,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewDelays {
    pub splash: Duration,
    pub thank_you: Duration,
}

impl Default for ViewDelays {
    fn default() -> Self {
        Self {
            splash: Duration::from_secs(3),
            thank_you: Duration::from_secs(4),
        }
    }
}

/// Pure transition function. `None` means the event does not apply in `state`.
pub fn reduce(state: ViewState, event: &ViewEvent) -> Option<ViewState> {
    match (state, event) {
        (ViewState::Splash, ViewEvent::SplashElapsed) => Some(ViewState::BookingWidget),
        (ViewState::BookingWidget, ViewEvent::BookRide { pickup, dropoff })
            if !pickup.trim().is_empty() && !dropoff.trim().is_empty() =>
        {
            Some(ViewState::ThankYou)
        }
        (ViewState::ThankYou, ViewEvent::ThankYouElapsed | ViewEvent::Continue) => {
            Some(ViewState::Survey)
        }
        _ => None,
    }
}

struct ViewInner {
    state: ViewState,
    delays: ViewDelays,
    timer: Option<ScopedTimer>,
    deadline: Option<Instant>,
}

/// Owns the top-level screen and the timers that move it along.
///
/// Timers belong to the screen that armed them: replacing the screen or
/// dropping the orchestrator cancels whatever was pending.
pub struct ViewOrchestrator {
    inner: Arc<Mutex<ViewInner>>,
}

impl ViewOrchestrator {
    /// Starts on the splash screen. Must be called inside a tokio runtime.
    pub fn start(delays: ViewDelays) -> Self {
        let inner = Arc::new(Mutex::new(ViewInner {
            state: ViewState::Splash,
            delays,
            timer: None,
            deadline: None,
        }));
        {
            let mut guard = lock(&inner);
            arm(&mut guard, Arc::downgrade(&inner));
        }
        tracing::debug!("View orchestrator started on splash");
        Self { inner }
    }

    pub fn state(&self) -> ViewState {
        lock(&self.inner).state
    }

    /// Time left until the current screen advances on its own, if it does.
    pub fn auto_advance_in(&self) -> Option<Duration> {
        lock(&self.inner)
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Applies a user or timer event. Returns the new screen when it changed.
    pub fn dispatch(&self, event: ViewEvent) -> Option<ViewState> {
        dispatch_on(&self.inner, &event)
    }

    /// Cancels any pending timed transition. The current screen stays.
    pub fn shutdown(&self) {
        let mut guard = lock(&self.inner);
        guard.timer = None;
        guard.deadline = None;
    }
}

fn lock(inner: &Mutex<ViewInner>) -> MutexGuard<'_, ViewInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn dispatch_on(inner: &Arc<Mutex<ViewInner>>, event: &ViewEvent) -> Option<ViewState> {
    let mut guard = lock(inner);
    let previous = guard.state;
    let Some(next) = reduce(previous, event) else {
        tracing::debug!("Ignoring {:?} while on {:?}", event, previous);
        return None;
    };
    guard.state = next;
    // drops the previous screen's timer
    arm(&mut guard, Arc::downgrade(inner));
    tracing::info!("View transition {:?} -> {:?}", previous, next);
    Some(next)
}

fn arm(guard: &mut ViewInner, weak: Weak<Mutex<ViewInner>>) {
    let (delay, event) = match guard.state {
        ViewState::Splash => (guard.delays.splash, ViewEvent::SplashElapsed),
        ViewState::ThankYou => (guard.delays.thank_you, ViewEvent::ThankYouElapsed),
        ViewState::BookingWidget | ViewState::Survey => {
            guard.timer = None;
            guard.deadline = None;
            return;
        }
    };
    guard.deadline = Some(Instant::now() + delay);
    guard.timer = Some(ScopedTimer::schedule(delay, move || {
        if let Some(inner) = weak.upgrade() {
            dispatch_on(&inner, &event);
        }
    }));
}
