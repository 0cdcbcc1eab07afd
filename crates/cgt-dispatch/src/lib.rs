//! # cgt-dispatch: Economic Dispatch and Loss Reconciliation
//!
//! The dispatch stage of chronics generation:
//!
//! - [`adapter`] - the [`DispatchAdapter`] contract to a cost-minimizing
//!   dispatch solver, plus the request/constraint types it consumes
//! - [`lp`] - the LP backend over good_lp (Clarabel), the default adapter
//! - [`evaluator`] - the [`FlowEvaluator`] contract to a physical-flow
//!   simulator, plus a proportional-loss stand-in
//! - [`reconcile`] - the loss-reconciliation loop alternating dispatch and
//!   evaluation until generator setpoints are loss-consistent
//!
//! The adapter and evaluator are the two seams of the stage: any solver or
//! simulator satisfying the contracts is substitutable without touching the
//! loop.

pub mod adapter;
pub mod evaluator;
pub mod lp;
pub mod reconcile;

pub use adapter::{
    default_slack_name, DispatchAdapter, DispatchError, DispatchRequest, DispatchableUnit,
    HydroConstraint,
};
pub use evaluator::{FlowEvaluation, FlowEvaluator, ProportionalLossEvaluator};
pub use lp::LpDispatch;
pub use reconcile::{
    ConvergenceState, FailureCause, InitialState, LossReconciliation, ReconcileOutcome,
    ReconcileParams, Reconciled,
};
