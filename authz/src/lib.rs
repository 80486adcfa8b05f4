//! Authorization vocabulary and decision clients for the PhotoFlash gateway.
//!
//! This crate turns "who wants to do what to which resource" into an
//! [`AuthorizationQuery`] and hands it to a [`DecisionClient`]. It does not
//! evaluate policies itself: decisions come from an external engine, either a
//! remote policy store ([`remote::HttpDecisionClient`]) or an in-process CEDAR
//! authorizer ([`cedar::CedarDecisionClient`]).
//!
//! # Architecture Overview
//!
//! 1. **Request arrives** at the API layer with an authenticated identity
//! 2. **Action descriptor** names the action, the resource and builds the entity graph
//! 3. **Assembler** combines them into one query ([`AuthorizationQuery::assemble`])
//! 4. **Decision client** submits the query and returns a [`Decision`]
//! 5. **Gate** runs the protected handler only when [`Decision::is_allow`] holds
//!
//! # Fail-closed rules
//!
//! - Only a verdict exactly equal to [`decision::PERMISSION_ALLOW`] grants access
//! - Engine failures are errors, never verdicts
//! - Missing entities are left for the engine to deny

pub mod cedar;
pub mod client;
pub mod decision;
pub mod error;
pub mod query;
pub mod remote;
pub mod types;

pub use client::DecisionClient;
pub use decision::{Decision, Diagnostics, PERMISSION_ALLOW};
pub use error::{AuthzError, Result};
pub use query::AuthorizationQuery;
pub use types::{Action, AttrValue, Entity, EntityGraph, EntityUid, Principal, Resource};
