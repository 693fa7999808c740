//! Hand-rolled error types for the runtime crate. No `thiserror`: manual
//! `Display`/`Error` impls, a flat enum with one variant per failure shape.

use std::fmt;

/// Failure compiling a textual program into a sequence of `Value`s.
/// Message text for each variant matches `Field.py::compile`'s error
/// strings verbatim, since those strings are part of the wire contract
/// with anything that greps a `.bopDB` file for rejected snippets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    MalformedTuple(String),
    MalformedPicture(String),
    MalformedVector(String),
    BadTupleArity(String),
    UnknownOpcode(String),
    EmptySource,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::MalformedTuple(s) => write!(f, "Malformed tuple: {s}"),
            CompileError::MalformedPicture(s) => write!(f, "Malformed picture: {s}"),
            CompileError::MalformedVector(s) => write!(f, "Malformed vector: {s}"),
            CompileError::BadTupleArity(s) => write!(f, "Tuple must be (color, int_pair or nesw): {s}"),
            CompileError::UnknownOpcode(s) => write!(f, "Unknown opcode: {s}"),
            CompileError::EmptySource => write!(f, "Empty source"),
        }
    }
}

impl std::error::Error for CompileError {}
