//! Network encoding of effect contexts.
//!
//! Only the in-process codec lives here; moving the bytes is the host's
//! business.

mod wire;

pub use wire::{decode_context, encode_context, presence_mask, read_context, write_context, ContextFields, WireError};
