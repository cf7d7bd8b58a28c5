//! Ports (traits) for collaborators that live outside the compiler.
//!
//! The compiler depends only on [`PortAllocator`]; the start/stop controller in
//! `app` additionally talks to an [`EnginePort`] and a [`HelperSupervisor`].
//! Implementations are injected by the caller.

pub mod allocator;
pub mod engine;

pub use allocator::*;
pub use engine::*;
