//! One-shot compression worker
//!
//! Each worker drives exactly one fresh engine subprocess and sends exactly
//! one reply. The engine's runtime is not safely re-entrant, so instances
//! are never reused across jobs; concurrency comes from spawning independent
//! workers.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::process::Command;

use flume::Sender;

use super::request::{CompressionJob, EngineFault, EngineReply};

const INPUT_NAME: &str = "input.pdf";
const OUTPUT_NAME: &str = "output.pdf";

/// Engine binary to invoke. Overridable through `PDFDECK_GS` for
/// nonstandard installs.
pub(crate) fn engine_binary() -> OsString {
    if let Some(binary) = std::env::var_os("PDFDECK_GS") {
        return binary;
    }
    if cfg!(windows) {
        OsString::from("gswin64c")
    } else {
        OsString::from("gs")
    }
}

/// Worker entry point: run the engine once, reply once.
pub(crate) fn compression_worker(job: CompressionJob, replies: Sender<EngineReply>) {
    let id = job.id;
    log::debug!("compression worker starting job {id:?} ({} bytes)", job.input.len());
    let reply = match run_engine(&engine_binary(), &job) {
        Ok(output) => EngineReply::Done { id, output },
        Err(fault) => EngineReply::Failed { id, fault },
    };
    // the caller may already have abandoned the job; a dead channel is fine
    let _ = replies.send(reply);
}

/// Invoke the engine with its fixed argument template, parameterized only by
/// the quality preset and the scratch paths. The scratch directory is the
/// engine's private filesystem and dies with this call.
pub(crate) fn run_engine(binary: &OsStr, job: &CompressionJob) -> Result<Vec<u8>, EngineFault> {
    let scratch = tempfile::tempdir().map_err(EngineFault::Scratch)?;
    let input_path = scratch.path().join(INPUT_NAME);
    let output_path = scratch.path().join(OUTPUT_NAME);
    fs::write(&input_path, &job.input).map_err(EngineFault::Scratch)?;

    let output = Command::new(binary)
        .arg("-sDEVICE=pdfwrite")
        .arg("-dCompatibilityLevel=1.5")
        .arg("-dNOPAUSE")
        .arg("-dBATCH")
        .arg("-dQUIET")
        .arg(format!("-dPDFSETTINGS=/{}", job.quality.name()))
        .arg(format!("-sOutputFile={}", output_path.display()))
        .arg(&input_path)
        .output()
        .map_err(EngineFault::Spawn)?;

    if !output.status.success() {
        return Err(EngineFault::Engine {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    fs::read(&output_path).map_err(EngineFault::Output)
}
