//! Revocation status determination using CRLs and OCSP responders

pub mod crl;
pub mod ocsp;

pub use crl::*;
pub use ocsp::*;
