//! Mirror engine module

pub mod engine;
pub mod materializer;

pub use engine::{MirrorEngine, MirrorPlan, MirrorReport};
