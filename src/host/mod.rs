//! Packer plug-in host surface
//!
//! [`adapter`] holds the operations every entry point shares; [`strings`]
//! converts between host narrow/wide strings and `String`; the exported
//! `extern "system"` functions live in `ffi`.

pub mod adapter;
mod ffi;
pub mod strings;

pub use adapter::{CallbackRegistration, HostCallbacks, Token, DEFAULT_TOKEN};

// Capability bits reported by GetPackerCaps
pub const PK_CAPS_NEW: i32 = 1;
pub const PK_CAPS_MODIFY: i32 = 2;
pub const PK_CAPS_MULTIPLE: i32 = 4;
pub const PK_CAPS_DELETE: i32 = 8;
pub const PK_CAPS_OPTIONS: i32 = 16;
pub const PK_CAPS_MEMPACK: i32 = 32;
pub const PK_CAPS_BY_CONTENT: i32 = 64;
pub const PK_CAPS_SEARCHTEXT: i32 = 128;

// Flags reported by GetBackgroundFlags
pub const BACKGROUND_UNPACK: i32 = 1;
pub const BACKGROUND_PACK: i32 = 2;
