// The three host-visible error kinds, plus the control-flow signals
// (`return`, `raise`) that thread their way up through statement
// execution without escaping to the host at all.

use std::fmt;

use enumflags2::BitFlags;

use crate::value::{TypeSet, TypeTag};

// Mirrors the three kinds accepted by Host::error -- this is the only
// shape the core is allowed to hand the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Name,
    Type,
    Fault,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Name => write!(f, "NAME_ERROR"),
            ErrorKind::Type => write!(f, "TYPE_ERROR"),
            ErrorKind::Fault => write!(f, "FAULT_ERROR"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EvalError {
    Name(String),
    Type(String),
    Fault(String),
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Name(_) => ErrorKind::Name,
            EvalError::Type(_) => ErrorKind::Type,
            EvalError::Fault(_) => ErrorKind::Fault,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            EvalError::Name(m) | EvalError::Type(m) | EvalError::Fault(m) => m,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

// Construct a "wrong type" EvalError from an expected set and what we
// actually saw -- same role as vm.rs's free-standing `expected`.
pub fn expected(expect: TypeSet, got: TypeTag, context: &str) -> EvalError {
    EvalError::Type(format!(
        "{}: expected {:?}, got {:?}",
        context, expect, got
    ))
}

pub fn expect_one(expect: TypeTag, got: TypeTag, context: &str) -> EvalError {
    expected(BitFlags::from_flag(expect), got, context)
}

pub fn name_error(message: impl Into<String>) -> EvalError {
    EvalError::Name(message.into())
}

pub fn fault(message: impl Into<String>) -> EvalError {
    EvalError::Fault(message.into())
}

// Non-local control flow produced while walking statements and
// expressions. `Error` is fatal and unwinds all the way out to the
// host; `Raise` and `Return` are ordinary language features that a
// `try`/`catch` or a function call boundary may intercept.
#[derive(Clone, Debug)]
pub enum Flow {
    Error(EvalError),
    Raise(String),
    Return(crate::value::Value),
}

impl From<EvalError> for Flow {
    fn from(e: EvalError) -> Flow {
        Flow::Error(e)
    }
}

pub type Flowing<T> = Result<T, Flow>;
