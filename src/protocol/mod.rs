mod command;
mod data;
mod packet;
pub mod constants;

pub use command::*;
pub use constants::*;
pub use data::*;
pub use packet::*;
