use stagecast_core::{PadId, SourceId};
use thiserror::Error;

/// Errors that can occur in the audio engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// No strip exists for the source
    #[error("no strip for source: {0}")]
    UnknownStrip(SourceId),

    /// No pad exists with the id
    #[error("unknown pad: {0}")]
    UnknownPad(PadId),

    /// A processor was configured with values it cannot run with
    #[error("bad settings: {0}")]
    BadSettings(String),
}
