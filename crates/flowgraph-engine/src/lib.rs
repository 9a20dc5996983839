//! The workflow execution engine: validation, scheduling, the typed
//! parameter system, and the collaborator traits a host wires up around
//! them. See `Runtime` for the single entry point.

pub mod credit;
pub mod error;
pub mod execution_store;
pub mod host;
pub mod monitoring;
pub mod nodes;
pub mod object_store;
pub mod parameters;
pub mod registry;
pub mod runtime;
pub mod scheduler;
pub mod validator;

pub use credit::{CreditError, CreditService, InMemoryCreditService};
pub use error::{RuntimeError, StorageError};
pub use execution_store::{ExecutionStore, ExecutionStoreError, InMemoryExecutionStore};
pub use host::{
    DeploymentFinder, EmailMessagePayload, HttpRequestPayload, IntegrationInfo, IntegrationProvider, NoIntegrations, NoSecrets,
    QueueMessagePayload, SecretProvider, WorkflowFinder,
};
pub use monitoring::{ChannelMonitoringSink, MonitoringSink, NoOpMonitoringSink};
pub use object_store::{Bucket, GetResult, InMemoryBucket, ObjectMetadata, ObjectRecord, ObjectStore, PutOptions};
pub use parameters::{from_wire, to_wire, ParameterError};
pub use registry::{
    NodeContext, NodeContextBuilder, NodeDescriptor, NodeExecutable, NodeFactory, NodeRegistry, NodeResult, NoOpProgressSink, ParameterSlot,
    ProgressSink,
};
pub use runtime::{Runtime, RuntimeConfig, RuntimeParams};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerInputs};
pub use validator::{validate, ValidationError};
