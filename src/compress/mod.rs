//! PDF compression through an isolated, one-shot engine subprocess

mod request;
mod service;
mod worker;

pub use request::{CompressionJob, EngineFault, EngineReply, JobId, Quality};
pub use service::{CompressionHandle, compress};
