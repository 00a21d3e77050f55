//! `@mention` references and the mutation scope they grant.
//!
//! A user message such as `"Tighten @launch-post#intro using @source:yt-42"`
//! flows through three stages:
//!
//! ```text
//! ┌────────────┐    ┌────────────────┐    ┌────────────────┐
//! │ tokenizer  │───▶│ resolver       │───▶│ scope builder  │
//! │ (token.rs) │    │ (application)  │    │ (scope.rs)     │
//! └────────────┘    └────────────────┘    └────────────────┘
//!  ReferenceToken    ResolvedReference     ReferenceScope
//! ```
//!
//! The tokenizer and scope builder are pure. Resolution needs storage, so its
//! use case lives in the application layer; the tier rules it applies are in
//! [`matching`] and the queries it issues are in [`query`].
//!
//! The scope is the authorization boundary for mutating tools: a write may
//! only touch entities mentioned in the *current* message.

pub mod entities;
pub mod matching;
pub mod query;
pub mod scope;
pub mod token;

pub use entities::{
    AmbiguousReference, ContentRecord, FileRecord, ReferenceCandidate, ReferenceKind,
    ResolutionOutcome, ResolvedReference, SectionRecord, SourceRecord, UnresolvedReason,
    UnresolvedReference,
};
pub use matching::{BestMatch, MatchTier, normalize_key, select_best_match};
pub use query::LookupQuery;
pub use scope::{ReferenceScope, build_scope};
pub use token::{AnchorKind, ReferenceAnchor, ReferenceToken, parse_references};
