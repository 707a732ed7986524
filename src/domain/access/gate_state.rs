//! Gate lifecycle state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle of one mount of a gated view.
///
/// `Granted`, `Exempt` and `Redirecting` are terminal, so a mount that has
/// been granted can never start a redirect and a redirect can never be
/// started twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateState {
    /// Waiting for an authenticated identity.
    CheckingAuth,

    /// Identity known; subscription lookup in flight.
    CheckingSubscription,

    /// View may render.
    Granted,

    /// Not entitled, but the view is the settings view itself, which
    /// renders without redirecting.
    Exempt,

    /// Not entitled; the user has been notified and is being sent to the
    /// settings view.
    Redirecting,
}

/// What the host UI should draw for a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateView {
    /// Render nothing.
    Nothing,
    /// Render a loading indicator.
    Loading,
    /// Render the protected children.
    Children,
}

impl GateState {
    pub fn view(&self) -> GateView {
        match self {
            GateState::CheckingAuth => GateView::Nothing,
            GateState::CheckingSubscription | GateState::Redirecting => GateView::Loading,
            GateState::Granted | GateState::Exempt => GateView::Children,
        }
    }
}

impl StateMachine for GateState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use GateState::*;
        matches!(
            (self, target),
            (CheckingAuth, CheckingSubscription)
                | (CheckingAuth, Granted)
                | (CheckingSubscription, Granted)
                | (CheckingSubscription, Exempt)
                | (CheckingSubscription, Redirecting)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use GateState::*;
        match self {
            CheckingAuth => vec![CheckingSubscription, Granted],
            CheckingSubscription => vec![Granted, Exempt, Redirecting],
            Granted | Exempt | Redirecting => vec![],
        }
    }
}
