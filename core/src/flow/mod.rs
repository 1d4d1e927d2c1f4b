// grocer/src/flow/mod.rs

//! A small asynchronous step-flow engine.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step has zero or more
//! handlers operating on a shared [`Shared<TData>`] context, an optional skip
//! condition, and an optional compensation. When a handler fails, the
//! compensations of every step that already completed run in reverse order
//! before the error is returned.

pub mod control;
pub mod pipeline;
pub mod shared;
pub mod step;

pub use control::{FlowOutcome, StepControl};
pub use pipeline::{Compensation, Handler, Pipeline};
pub use shared::Shared;
pub use step::{SkipCondition, StepDef};
