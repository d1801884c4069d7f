//! Domain rules with no I/O: authorization predicates over typed roles

pub mod access;

pub use access::Caller;
