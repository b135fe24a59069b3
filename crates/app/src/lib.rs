//! # voicehub-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `RegistryRepository`: load the registry, commit change sets
//!   - `ArtifactCache`: keep generated grammars across restarts
//!   - `Dispatcher`: hand resolved commands to the home-automation backend
//! - Define **driving/inbound ports** as use-case structs:
//!   - `RegistryService`: serialised registry edits, imports, snapshots
//!   - `GrammarWorker` / `GrammarHandle`: debounced background regeneration
//!   - `CommandService`: resolve engine output and dispatch it
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `voicehub-domain` only (plus `tokio` for channels, tasks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod grammar_worker;
pub mod ports;
pub mod services;
