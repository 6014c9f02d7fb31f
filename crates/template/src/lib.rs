//! Peekaboo template interpolation
//!
//! Placeholder substitution for prompts, request bodies and header values.
//! Two dialects are supported: named `{$identifier}` and positional
//! `{#1}` / `{#n}`.

mod interpolate;

pub use interpolate::{interpolate, interpolate_or_keep, Fallback, Values};
