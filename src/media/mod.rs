//! Media module for posts, image resolution and filtering.

pub mod filter;
pub mod item;
pub mod resolver;

pub use filter::{accept, is_accepted, RejectReason};
pub use item::{MediaCandidate, Post, ResolutionRule, ResolvedImage};
pub use resolver::resolve;
