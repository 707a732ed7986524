//! Access gate domain module.
//!
//! Pure lifecycle of a gated view. The async driver lives in
//! `application::access_gate`.

mod gate_state;

pub use gate_state::{GateState, GateView};
