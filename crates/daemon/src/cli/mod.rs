pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Daemon, Hash, Health, Identity, Init, Version};
