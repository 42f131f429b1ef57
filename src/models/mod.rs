//! Data model for MRT records, BGP messages and flattened route elements.
pub mod aspath;
pub mod attributes;
pub mod bgp;
pub mod community;
pub mod elem;
pub mod mrt;
pub mod network;

pub use aspath::*;
pub use attributes::*;
pub use bgp::*;
pub use community::*;
pub use elem::*;
pub use mrt::*;
pub use network::*;
