//! Reference lookup adapters.
//!
//! Workspace fixtures loaded from TOML and an in-memory
//! [`ReferenceLookupPort`](scribe_application::ReferenceLookupPort) over them.

mod fixture;
mod in_memory;

pub use fixture::{FixtureContent, FixtureError, FixtureSection, WorkspaceFixture};
pub use in_memory::InMemoryReferenceLookup;
