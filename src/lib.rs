#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod certificate;
pub mod environment;
pub mod revocation;
pub mod util;
pub mod validator;

pub use crate::certificate::*;
pub use crate::environment::*;
pub use crate::revocation::*;
pub use crate::util::*;
pub use crate::validator::*;
