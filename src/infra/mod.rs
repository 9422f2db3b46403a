//! Infrastructure adapters for input, output and auxiliary artifact streams.

pub mod artifact;
pub mod input;
pub mod output;

pub use artifact::{read_vectors, ArtifactSink};
pub use input::{parse_payload, JsonlInput};
pub use output::{scan_completed, JsonlOutput};
