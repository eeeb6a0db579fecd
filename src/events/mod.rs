//! Messages and events exchanged with the collaborators outside the engine.
//!
//! Submodules:
//! - [`contact`] – contacts reported by physics
//! - [`delayedcall`] – a delayed call came due
//! - [`render`] – presentation commands for the renderer
pub mod contact;
pub mod delayedcall;
pub mod render;
