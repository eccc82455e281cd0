pub mod domain;
pub mod error;
pub mod network;
pub mod protocol;
