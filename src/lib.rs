//! glacierm
//!
//! Upload large archives to Glacier vaults in bounded-size parts, computing the
//! SHA-256 tree hash the service uses to verify the whole archive.

pub mod cli;
pub mod glacier;
pub mod upload;
