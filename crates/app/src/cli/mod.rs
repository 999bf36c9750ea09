pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Get, Init, Nodes, Put, Version};
