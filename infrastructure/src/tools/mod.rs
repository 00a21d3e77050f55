//! Tool adapters.
//!
//! - [`JsonSchemaToolConverter`] renders tool definitions for the model
//! - [`DryRunToolExecutor`] executes tools against a workspace fixture
//!   without side effects

mod dry_run;
mod schema;

pub use dry_run::DryRunToolExecutor;
pub use schema::JsonSchemaToolConverter;
