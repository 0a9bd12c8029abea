mod controller;
mod machine;
mod reconciler;

pub use controller::LifecycleController;
pub use machine::{LifecycleEffect, LifecycleInput, LifecycleMachine, PollTicket, UserAction};
pub use reconciler::StatusReconciler;
