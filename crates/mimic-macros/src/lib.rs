//! Procedural macros for the Mimic framework.
//!
//! This crate provides:
//!
//! - `#[derive(MappedEvent)]` - Generates the mapping spec and typed
//!   constructor used to build a canonical event from a host-native object
//!
//! # MappedEvent Derive Macro
//!
//! ```rust,ignore
//! use mimic::prelude::*;
//!
//! #[derive(Debug, Clone, MappedEvent)]
//! #[mapped(natives = ["host.event.PlayerChatEvent"])]
//! pub struct UserChatEvent {
//!     #[mapped(names = ["player", "getPlayer()"], transform = "mimic.User")]
//!     user: User,
//!     #[mapped(names = ["message", "getMessage()"])]
//!     message: String,
//!     #[mapped(names = ["cancelled", "isCancelled()"], platform_specific)]
//!     cancelled: bool,
//! }
//! ```

mod mapped;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `Mapped` for a struct with named fields.
///
/// Generated code reaches the core types through `::mimic::__private`;
/// crates below the facade pass `#[mapped(crate = "mimic_core")]`.
///
/// # Attributes
///
/// - `#[mapped(natives = [...])]` on the struct - Host-native type names
/// - `#[mapped(crate = "...")]` on the struct - Path to the core types
/// - `#[mapped(names = [...])]` on a field - Ordered candidate source names;
///   `name()` marks an accessor, a bare name marks a field
/// - `#[mapped(platform_specific)]` - The field may be absent on some hosts
/// - `#[mapped(transform = "...", data = [...])]` - Transform the raw value
///   into the given type key, passing free-form parameters
///
/// Fields without `#[mapped]` start from `Default::default()`.
#[proc_macro_derive(MappedEvent, attributes(mapped))]
pub fn derive_mapped_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match mapped::derive_mapped_event(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
