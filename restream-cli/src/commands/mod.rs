pub mod copy;
pub mod dump;
pub mod pack;
pub mod unpack;
