use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod config;
pub mod coordinator;
pub mod edit;
pub mod host;
pub mod pair;
pub mod tracker;

pub type Tendril = SmartString<LazyCompact>;
