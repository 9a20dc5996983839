//! # flowgraph-model
//!
//! The data model shared by every layer of the flowgraph workflow execution
//! engine: workflow graphs, nodes, edges, typed parameters, and execution
//! records. This crate has no I/O of its own; it only defines shapes and the
//! pure relations between them (e.g. parameter-type compatibility).

pub mod error;
pub mod execution;
pub mod node;
pub mod parameter;
pub mod workflow;

pub use error::ModelError;
pub use execution::{NodeExecution, NodeExecutionStatus, Visibility, WorkflowExecution, WorkflowExecutionStatus};
pub use node::{Node, NodeInput, NodeOutput};
pub use parameter::{BinaryData, EngineValue, ObjectReference, ParameterType, WireValue};
pub use workflow::{Edge, TriggerType, Workflow};
