//! plantguard — plant photo toxicity assessment core.
//!
//! ARCHITECTURE
//! ============
//! The crate sits between an unreliable, free-text-producing inference
//! service and a strongly typed `Analysis` record:
//!
//! - `image` turns upload bytes into an embedded `data:` URI.
//! - `llm` speaks the provider wire protocols behind the `LlmChat` trait.
//! - `services::validator` projects untyped model JSON into a typed draft.
//! - `error` reduces every failure to one of five stable codes.
//! - `services::analyzer` and `services::conversation` drive the two
//!   request/response protocols.
//! - `services::history` owns the persisted, capped list of past analyses.

pub mod error;
pub mod image;
pub mod llm;
pub mod plant;
pub mod services;
