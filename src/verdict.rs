//! Verdicts and the decision policy.
//!
//! ```text
//!   score ──[score > threshold]──▶ DEFECT / kind 1 (surface stain)
//!     │
//!     └──────[otherwise]─────────▶ OK / kind 0
//! ```
//!
//! Each cycle is decided on its own score alone: no hysteresis, no
//! N-of-M confirmation across frames.

use core::fmt;

/// Result code as the PLC program expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum ResultCode {
    Ok = 1,
    Defect = 2,
}

impl ResultCode {
    pub const fn code(self) -> i16 {
        self as i16
    }

    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Ok),
            2 => Some(Self::Defect),
            _ => None,
        }
    }
}

/// Defect classification.  `0` means no defect; the set is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefectKind(i16);

impl DefectKind {
    pub const NONE: Self = Self(0);
    pub const SURFACE_STAIN: Self = Self(1);

    pub const fn code(self) -> i16 {
        self.0
    }

    pub const fn from_code(code: i16) -> Self {
        Self(code)
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Outcome of one inspection cycle.
///
/// `defect_kind` is non-zero exactly when `result` is [`ResultCode::Defect`];
/// the constructors are the only way to build one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Verdict {
    result: ResultCode,
    defect_kind: DefectKind,
}

impl Verdict {
    pub const fn ok() -> Self {
        Self {
            result: ResultCode::Ok,
            defect_kind: DefectKind::NONE,
        }
    }

    /// A rejection of the given kind.  Returns `None` for [`DefectKind::NONE`].
    pub const fn defect(kind: DefectKind) -> Option<Self> {
        if kind.is_none() {
            return None;
        }
        Some(Self {
            result: ResultCode::Defect,
            defect_kind: kind,
        })
    }

    /// Rebuild a verdict from raw codes, enforcing the invariant.
    pub fn from_codes(result: i16, defect_kind: i16) -> Option<Self> {
        match ResultCode::from_code(result)? {
            ResultCode::Ok if defect_kind == 0 => Some(Self::ok()),
            ResultCode::Defect => Self::defect(DefectKind::from_code(defect_kind)),
            ResultCode::Ok => None,
        }
    }

    pub const fn result(&self) -> ResultCode {
        self.result
    }

    pub const fn defect_kind(&self) -> DefectKind {
        self.defect_kind
    }

    pub const fn is_defect(&self) -> bool {
        matches!(self.result, ResultCode::Defect)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result {
            ResultCode::Ok => write!(f, "OK"),
            ResultCode::Defect => write!(f, "DEFECT(kind={})", self.defect_kind.code()),
        }
    }
}

/// Fixed-threshold decision rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionPolicy {
    threshold: u32,
}

impl DecisionPolicy {
    pub const fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn decide(&self, score: u32) -> Verdict {
        decide(score, self.threshold)
    }
}

/// `score > threshold` rejects as a surface stain; anything else passes.
pub fn decide(score: u32, threshold: u32) -> Verdict {
    if score > threshold {
        Verdict {
            result: ResultCode::Defect,
            defect_kind: DefectKind::SURFACE_STAIN,
        }
    } else {
        Verdict::ok()
    }
}
