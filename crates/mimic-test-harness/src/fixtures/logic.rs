//! Plain functions to spy on.

use mimic_mock::FnSlot;
use std::fmt;

/// Operation requested from [`Logic::throw_or_return`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Return,
    Throw,
}

impl Op {
    /// Parse an operation name. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "return" => Some(Self::Return),
            "throw" => Some(Self::Throw),
            _ => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Return => f.write_str("return"),
            Self::Throw => f.write_str("throw"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogicError {
    /// The caller asked for a failure.
    #[error("{0}")]
    Thrown(String),

    #[error("invalid operation: {0}")]
    InvalidOp(String),
}

/// Two spyable functions.
pub struct Logic {
    pub sum: FnSlot<(i64, i64), i64>,
    pub throw_or_return: FnSlot<(String, String), String, LogicError>,
}

impl Logic {
    pub fn new() -> Self {
        Self {
            sum: FnSlot::new("logic.sum", |(a, b): (i64, i64)| Ok(a + b)),
            throw_or_return: FnSlot::new("logic.throw_or_return", |(message, op): (String, String)| {
                match Op::parse(&op) {
                    Some(Op::Return) => Ok(message),
                    Some(Op::Throw) => Err(LogicError::Thrown(message)),
                    None => Err(LogicError::InvalidOp(op)),
                }
            }),
        }
    }

    pub fn sum(&self, a: i64, b: i64) -> i64 {
        self.sum.call_infallible((a, b))
    }

    pub fn throw_or_return(&self, message: &str, op: Op) -> Result<String, LogicError> {
        self.throw_or_return
            .call((message.to_string(), op.to_string()))
    }
}

impl Default for Logic {
    fn default() -> Self {
        Self::new()
    }
}
