//! Domain model: identifiers, ledger records, and the workflow error
//! taxonomy.

mod errors;
mod types;

pub use errors::WorkflowError;
pub use types::{
    ActionKind, Actor, Asset, AssetDefinition, AssetId, Handle, MediaRef, Participant,
    PendingRequest, Verdict,
};
