//! Compression job and reply types

use std::fmt;
use std::process::ExitStatus;
use std::str::FromStr;

/// Unique identifier for one compression invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

impl JobId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Engine quality preset controlling image/font downsampling aggressiveness
/// (screen < ebook < printer < prepress).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Quality {
    Screen,
    #[default]
    Ebook,
    Printer,
    Prepress,
}

impl Quality {
    /// Preset name as it appears in the engine's `PDFSETTINGS` flag.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Screen => "screen",
            Self::Ebook => "ebook",
            Self::Printer => "printer",
            Self::Prepress => "prepress",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "screen" => Ok(Self::Screen),
            "ebook" => Ok(Self::Ebook),
            "printer" => Ok(Self::Printer),
            "prepress" => Ok(Self::Prepress),
            other => Err(format!(
                "unknown quality preset '{other}' (expected screen, ebook, printer or prepress)"
            )),
        }
    }
}

/// One compression request: a unique id, an independent copy of the input
/// bytes, and the quality preset. Lives for exactly one worker invocation.
#[derive(Debug)]
pub struct CompressionJob {
    pub id: JobId,
    pub input: Vec<u8>,
    pub quality: Quality,
}

/// Errors produced inside the engine worker.
#[derive(Debug, thiserror::Error)]
pub enum EngineFault {
    #[error("failed to start compression engine: {0}")]
    Spawn(std::io::Error),

    #[error("compression engine exited with {status}: {stderr}")]
    Engine { status: ExitStatus, stderr: String },

    #[error("engine scratch directory: {0}")]
    Scratch(std::io::Error),

    #[error("engine produced no readable output: {0}")]
    Output(std::io::Error),
}

/// Reply from a compression worker, correlated by job id.
#[derive(Debug)]
pub enum EngineReply {
    /// Successful pass; ownership of the output buffer moves to the caller.
    Done { id: JobId, output: Vec<u8> },

    /// The engine failed; no output buffer is ever attached.
    Failed { id: JobId, fault: EngineFault },
}

impl EngineReply {
    #[must_use]
    pub fn id(&self) -> JobId {
        match self {
            Self::Done { id, .. } | Self::Failed { id, .. } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_round_trips_through_names() {
        for quality in [
            Quality::Screen,
            Quality::Ebook,
            Quality::Printer,
            Quality::Prepress,
        ] {
            assert_eq!(quality.name().parse::<Quality>().unwrap(), quality);
        }
    }

    #[test]
    fn quality_rejects_unknown_preset() {
        assert!("best".parse::<Quality>().is_err());
    }

    #[test]
    fn default_quality_is_ebook() {
        assert_eq!(Quality::default(), Quality::Ebook);
    }
}
