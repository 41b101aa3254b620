//! Stream retrieval: endpoint fan-out, fetching, decryption, persistence
//!
//! One download flows through this module top to bottom:
//!
//! ```text
//! src/fetch/
//! ├── endpoints.rs  ← candidate URL fan-out + fixed request headers
//! ├── stream.rs     ← streaming GET, chunked body, FetchError
//! ├── decrypt.rs    ← incremental frame decryption
//! ├── sink.rs       ← temp-file persistence with size validation
//! ├── progress.rs   ← throttled phase/byte reporting
//! └── pipeline.rs   ← Retriever orchestration, DownloadResult
//! ```

pub mod decrypt;
pub mod endpoints;
pub mod pipeline;
pub mod progress;
pub mod sink;
pub mod stream;

// Re-export commonly used types
pub use decrypt::{FrameCipherKind, FrameDecryptor};
pub use endpoints::CandidateEndpoint;
pub use pipeline::{DownloadResult, Retriever};
pub use progress::{DownloadProgress, PipelinePhase, ProgressCallback};
pub use sink::FileSink;
pub use stream::{FetchError, StreamFetcher, TrackStream};
