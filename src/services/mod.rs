//! Orchestration services consumed by the UI collaborator.
//!
//! ARCHITECTURE
//! ============
//! `analyzer` and `conversation` own the two inference protocols,
//! `validator` guards the boundary with untyped model output, and
//! `history` owns the canonical copies of every `Analysis`.

pub mod analyzer;
pub mod conversation;
pub mod history;
pub mod persistence;
pub mod validator;

// =============================================================================
// TEST HELPERS
// =============================================================================
