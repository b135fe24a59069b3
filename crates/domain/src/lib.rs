//! # voicehub-domain
//!
//! Pure domain model for the voicehub command pipeline.
//!
//! ## Responsibilities
//! - Foundational types: typed names, error conventions
//! - Define **Devices** (controllable units with a type, a location and an optional value range)
//! - Define the **Registry** (devices + open sets of device types and locations, versioned)
//! - Define the **Action vocabulary** (which action tokens each device type accepts)
//! - **Classify** raw imported descriptors into a `(device type, location)` guess
//! - **Validate** the "one enabled device per `(type, location)`" invariant
//! - **Generate** a GBNF grammar and its pair index from a validated registry
//! - **Resolve** a grammar-conformant command into a neutral dispatch request
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod action;
pub mod classifier;
pub mod command;
pub mod device;
pub mod grammar;
pub mod registry;
pub mod validation;
