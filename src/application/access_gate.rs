//! AccessGate - drives one mount of a gated view.
//!
//! The gate performs at most one status lookup and at most one
//! notify-then-redirect per mount. The `GateState` held in the watch
//! channel is the only latch: a side effect runs only when the transition
//! that licenses it succeeds, and terminal states accept no transitions.
//!
//! ```ignore
//! let mut gate = AccessGate::new(options, status_service, navigator);
//! match gate.render(session.user_id()) {
//!     GateView::Nothing => {}
//!     GateView::Loading => draw_spinner(),
//!     GateView::Children => draw_view(),
//! }
//! // on unmount
//! gate.unmount();
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::application::handlers::subscription::SubscriptionStatusService;
use crate::domain::access::{GateState, GateView};
use crate::domain::foundation::{StateMachine, UserId};
use crate::domain::subscription::StatusSnapshot;
use crate::ports::{Notice, ViewNavigator};

/// Default route of the subscription settings view.
pub const DEFAULT_SETTINGS_ROUTE: &str = "/settings";

/// Per-view configuration supplied by the host UI.
#[derive(Debug, Clone)]
pub struct GuardOptions {
    /// Whether the view needs an active subscription.
    pub requires_subscription: bool,
    /// Whether the view being gated is the settings view itself.
    pub is_settings_view: bool,
    pub settings_route: String,
    /// Delay between the notification and the navigation.
    pub redirect_delay: Duration,
    /// Lookups slower than this read as inactive.
    pub lookup_timeout: Duration,
    pub notice: Notice,
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self {
            requires_subscription: true,
            is_settings_view: false,
            settings_route: DEFAULT_SETTINGS_ROUTE.to_string(),
            redirect_delay: Duration::from_secs(2),
            lookup_timeout: Duration::from_secs(10),
            notice: Notice::new(
                "Subscription required",
                "An active subscription is required to access this feature.",
            ),
        }
    }
}

impl GuardOptions {
    pub fn requiring_subscription(requires_subscription: bool) -> Self {
        Self {
            requires_subscription,
            ..Self::default()
        }
    }

    pub fn settings_view(mut self) -> Self {
        self.is_settings_view = true;
        self
    }
}

/// Applies a transition if the state machine allows it.
///
/// Returns true only for the caller whose transition took effect.
fn advance(state: &watch::Sender<GateState>, target: GateState) -> bool {
    state.send_if_modified(|current| match current.transition_to(target) {
        Ok(next) => {
            *current = next;
            true
        }
        Err(_) => false,
    })
}

/// One mount of a gated view.
pub struct AccessGate {
    options: Arc<GuardOptions>,
    status: SubscriptionStatusService,
    navigator: Arc<dyn ViewNavigator>,
    state: Arc<watch::Sender<GateState>>,
    task: Option<JoinHandle<()>>,
}

impl AccessGate {
    pub fn new(
        options: GuardOptions,
        status: SubscriptionStatusService,
        navigator: Arc<dyn ViewNavigator>,
    ) -> Self {
        let (state, _) = watch::channel(GateState::CheckingAuth);
        Self {
            options: Arc::new(options),
            status,
            navigator,
            state: Arc::new(state),
            task: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    /// Decides what to draw for the current identity.
    ///
    /// Safe to call on every re-render. Must be called from within a Tokio
    /// runtime: the first call with an identity on a view that needs a
    /// subscription spawns the lookup.
    pub fn render(&mut self, identity: Option<&UserId>) -> GateView {
        if self.state() != GateState::CheckingAuth {
            return self.state().view();
        }

        let Some(user_id) = identity else {
            return GateView::Nothing;
        };

        if !self.options.requires_subscription {
            advance(&self.state, GateState::Granted);
        } else if advance(&self.state, GateState::CheckingSubscription) {
            self.task = Some(self.spawn_check(user_id.clone()));
        }

        self.state().view()
    }

    fn spawn_check(&self, user_id: UserId) -> JoinHandle<()> {
        let options = Arc::clone(&self.options);
        let status = self.status.clone();
        let navigator = Arc::clone(&self.navigator);
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            let snapshot = lookup(&status, &user_id, options.lookup_timeout).await;

            let target = if snapshot.is_active() {
                GateState::Granted
            } else if options.is_settings_view {
                GateState::Exempt
            } else {
                GateState::Redirecting
            };

            if !advance(&state, target) || target != GateState::Redirecting {
                return;
            }

            tracing::info!(
                user_id = %user_id,
                status = %snapshot.status,
                route = %options.settings_route,
                "Subscription required; redirecting to settings"
            );
            navigator.notify(&options.notice);
            tokio::time::sleep(options.redirect_delay).await;
            navigator.navigate(&options.settings_route);
        })
    }

    /// Waits until the gate has reached a terminal state.
    ///
    /// Returns immediately while no identity has been rendered, since the
    /// gate cannot progress until one is.
    pub async fn settled(&self) -> GateState {
        let mut rx = self.state.subscribe();
        if *rx.borrow() == GateState::CheckingAuth {
            return GateState::CheckingAuth;
        }
        let settled = match rx.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        settled
    }

    /// Tears the mount down, cancelling a pending lookup or redirect.
    pub fn unmount(self) {}
}

impl Drop for AccessGate {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Reads the user's status through the facade. Lookups slower than
/// `limit` read as inactive.
async fn lookup(
    status: &SubscriptionStatusService,
    user_id: &UserId,
    limit: Duration,
) -> StatusSnapshot {
    match tokio::time::timeout(limit, status.get_access_status(user_id)).await {
        Ok(snapshot) => snapshot,
        Err(_) => {
            tracing::warn!(
                user_id = %user_id,
                timeout_ms = limit.as_millis() as u64,
                "Gate status lookup timed out; treating user as inactive"
            );
            StatusSnapshot::inactive()
        }
    }
}
