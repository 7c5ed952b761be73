//! Packets and names exchanged with the face.

mod interest;
mod name;

pub use interest::{Data, Interest};
pub use name::{Component, Name};
