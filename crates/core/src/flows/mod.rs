pub mod engine;
pub mod states;

pub use engine::{FlowDefinition, FlowEngine, FlowTransitionError, QualificationFlow};
pub use states::{Stage, StageEvent, TransitionOutcome};
