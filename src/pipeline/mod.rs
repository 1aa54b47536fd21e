//! Pipeline stages for chunked document jobs.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable and the remote transport can be swapped without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ chunk ──▶ request ──▶ rotate ──▶ assemble
//! (path/URL) (units)  (parts)    (gemini +   (fences, join)
//!                                 classify)
//! ```
//!
//! 1. [`input`]    — read paths or download URLs into memory; sniff media types
//! 2. [`chunk`]    — group pages / split text into bounded [`chunk::WorkUnit`]s
//! 3. [`request`]  — instruction + content parts for one unit
//! 4. [`rotate`]   — send one unit, trying keys in order; the only stage with
//!    network I/O, via [`gemini::RemoteModel`]
//! 5. [`classify`] — decide what a failed attempt means for the rotation
//! 6. [`assemble`] — strip fences from each unit and join them in order
//!
//! The sequencing of units (pause, resume, progress) lives in [`crate::job`].

pub mod assemble;
pub mod chunk;
pub mod classify;
pub mod gemini;
pub mod input;
pub mod request;
pub mod rotate;
