use super::sig_num::SigId;

/// provenance of an occurrence
/// when the raise is process-directed the code is `User`,
/// a thread-directed raise is marked `TKill`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SigCode {
    /// sent by a process-directed kill
    User,
    /// sent by a thread-directed tkill
    TKill,
}

/// one signal occurrence
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SigInfo {
    /// signal identifier
    pub sig: SigId,
    /// signal code
    pub code: SigCode,
}

impl SigInfo {
    pub fn new(sig: SigId, code: SigCode) -> Self {
        Self { sig, code }
    }
}
