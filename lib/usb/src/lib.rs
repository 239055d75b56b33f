//! Building and decoding the Setup packets that start USB control transfers, along with the
//! constants from the USB specification needed to describe them.

#![no_std]

pub mod class;
pub mod descriptor;
pub mod error;
pub mod setup;
pub mod transfer;

pub use error::SetupError;
pub use setup::{SetupPacket, SetupPacketBuilder};
