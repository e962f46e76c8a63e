//! # Classification Engine
//!
//! Structural inference over prepared builders:
//!
//! - [`nodelet`]: nodelet manager / nodelet detection from bond topics and
//!   management services, then manager linking.
//! - [`action`]: promotion of five conventionally named topics to one action,
//!   and role assignment of the nodes touching them.
//!
//! Both run on builders, after filtering and before extraction.

pub mod action;
pub mod nodelet;

pub use action::{ActionBuilder, action_construct_type, extract_actions, is_action_suffix};
pub use nodelet::{NodeClass, classify_node, link_nodelets};
