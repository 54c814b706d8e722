//! Output artifact, sinks and the retrying publisher.

pub mod artifact;
pub mod publisher;
pub mod sink;

pub use artifact::{artifact_header, read_artifact, write_artifact, ArtifactError};
pub use publisher::{content_hash, PublishOutcome, Publisher};
pub use sink::{is_http_location, FileSink, FileSnapshot, HttpSink, HttpSnapshot};
