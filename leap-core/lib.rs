pub mod position;
pub mod shift;

pub use position::{
  Position,
  Range,
};
pub use shift::shift;
