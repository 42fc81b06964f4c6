//! DDC/CI capability probing
//!
//! A probe issues a fixed list of VCP feature queries against one monitor,
//! retrying each a few times, and classifies how responsive the control
//! channel is. Identity codes in the results are decoded into a
//! [`VendorIdentity`].

mod prober;
mod vendor;

pub use prober::{classify, CapabilityProber};
pub use vendor::{
    decode_ascii, decode_bcd_version, decode_numeric_version, decode_vendor_field, FieldKind,
    VendorField, VendorIdentity,
};

use serde::{Deserialize, Serialize};

use crate::display::{FeatureReply, QueryError};

/// Overall responsiveness of a monitor's control channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Responsiveness {
    /// Every probed code answered
    FullyResponsive,
    /// Some codes answered, none faulted
    PartiallyResponsive,
    /// No code answered, none faulted
    NonResponsive,
    /// At least one code ended in a channel fault
    CommunicationError,
    /// Nothing was probed
    Unknown,
}

impl Responsiveness {
    pub fn is_responsive(&self) -> bool {
        matches!(self, Self::FullyResponsive | Self::PartiallyResponsive)
    }
}

/// Why a probed code has no value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeFailure {
    Unsupported,
    Fault { code: u32, message: String },
    /// Not attempted because the probe budget ran out
    Skipped,
}

impl From<QueryError> for ProbeFailure {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Unsupported => Self::Unsupported,
            QueryError::Fault { code, message } => Self::Fault { code, message },
        }
    }
}

/// Outcome of querying a single VCP code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub code: u8,
    pub success: bool,
    pub current: Option<u16>,
    pub max: Option<u16>,
    pub error: Option<ProbeFailure>,
    /// Queries issued for this code
    pub attempts: u8,
}

impl ProbeResult {
    pub fn succeeded(code: u8, reply: FeatureReply, attempts: u8) -> Self {
        Self {
            code,
            success: true,
            current: Some(reply.current),
            max: Some(reply.max),
            error: None,
            attempts,
        }
    }

    pub fn failed(code: u8, error: ProbeFailure, attempts: u8) -> Self {
        Self {
            code,
            success: false,
            current: None,
            max: None,
            error: Some(error),
            attempts,
        }
    }

    pub fn skipped(code: u8) -> Self {
        Self::failed(code, ProbeFailure::Skipped, 0)
    }

    pub fn is_fault(&self) -> bool {
        matches!(self.error, Some(ProbeFailure::Fault { .. }))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.error, Some(ProbeFailure::Skipped))
    }

    /// `(max << 16) | current` for successful results
    pub fn raw(&self) -> Option<u32> {
        match (self.current, self.max) {
            (Some(current), Some(max)) => Some(FeatureReply { current, max }.raw()),
            _ => None,
        }
    }
}

/// Result of one probe call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityReport {
    pub responsiveness: Responsiveness,
    pub results: Vec<ProbeResult>,
    pub vendor: VendorIdentity,
    pub elapsed_ms: u64,
}

impl CapabilityReport {
    /// Report for a monitor that was never probed
    pub fn unknown() -> Self {
        Self {
            responsiveness: Responsiveness::Unknown,
            results: Vec::new(),
            vendor: VendorIdentity::default(),
            elapsed_ms: 0,
        }
    }

    pub fn result(&self, code: u8) -> Option<&ProbeResult> {
        self.results.iter().find(|r| r.code == code)
    }

    /// Codes that answered
    pub fn supported_codes(&self) -> Vec<u8> {
        self.results.iter().filter(|r| r.success).map(|r| r.code).collect()
    }
}
