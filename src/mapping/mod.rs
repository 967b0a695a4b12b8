//! Source mapping and target discovery
//!
//! Everything the debugger front end needs once an endpoint exists:
//! turning device script URLs into local files and describing the target
//! it should connect to.

pub mod target;
pub mod transformer;

pub use target::{Target, TargetDiscovery};
pub use transformer::{FileProbe, PathTransformer, RealFs};
