//! Service layer
//!
//! Services contain the business logic of the worker: transforming the
//! input, rendering artifacts, executing a job end to end and reporting its
//! outcome.
//!
//! All services are trait-based to enable testing and dependency injection.

pub mod execution;
pub mod render;
pub mod reporter;
pub mod transform;

// Re-export traits
pub use execution::ExecutionService;
pub use reporter::ReporterService;
pub use transform::Transformer;

// Re-export implementations
pub use execution::StandardExecutionService;
pub use reporter::{CallbackReporter, UnconfiguredReporter};
pub use transform::{EchoTransformer, HttpTransformer};
