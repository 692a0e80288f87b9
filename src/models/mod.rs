//! Data models for flowtion.
//!
//! This module contains all the core data structures used throughout the system.

mod archive;
mod conversation;
mod domain;
mod node;
mod pattern;
mod workspace;

pub use archive::{ArchiveOutcome, ArchiveRecord, ArchiveSummary};
pub use conversation::{
    Candidate, Collision, CollisionKind, ConverseRequest, ConverseResponse, Link, ParsedResponse,
};
pub use domain::{Action, Affect, Frequency, ModelPreference, NodeType};
pub use node::{Node, NodeId, NodePatch, Position};
pub use pattern::PatternLog;
pub use workspace::{Block, BlockPatch, NewBlock, NewPage, Page, PagePatch, PublicUser, User};
