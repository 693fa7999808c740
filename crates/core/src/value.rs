//! Value: the tagged union the VM stack, registers and primitives speak.
//!
//! This is pure data — no pointers to VM state, no function pointers. A
//! `Function` value carries only its name and declared signature; resolving
//! a name to a callable body is the runtime's job (`arc_synth_runtime::primitives`),
//! not core's. This mirrors the split the wider language-implementation
//! examples in this codebase draw between "values" and "what can execute them".

use crate::grid::{Grid, IntPair, Mask, Nesw};
use std::fmt;

/// The tag of a `Value`, plus two signature-only pseudo-tags (`Core`,
/// `Nothing`) that are legal in a primitive's declared argument/return types
/// but never appear as the tag of an actual `Value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Integer,
    IntPair,
    Nesw,
    Vector,
    Grid,
    MaskedGrid,
    GridTuple,
    Function,
    Error,
    NoError,
    /// Signature-only: marks a core primitive's implicit VM-state argument.
    Core,
    /// Signature-only: a core primitive that pushes nothing.
    Nothing,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Type::Integer => "integer",
            Type::IntPair => "int_pair",
            Type::Nesw => "nesw",
            Type::Vector => "vector",
            Type::Grid => "grid",
            Type::MaskedGrid => "masked_grid",
            Type::GridTuple => "grid_tuple",
            Type::Function => "function",
            Type::Error => "error",
            Type::NoError => "no_error",
            Type::Core => "core",
            Type::Nothing => "nothing",
        };
        write!(f, "{s}")
    }
}

/// A handle to a named primitive: carries its declared signature so the
/// executor can type-check without consulting the registry. Equality is by
/// name (primitive names are unique within a registry).
#[derive(Debug, Clone)]
pub struct FunctionHandle {
    pub name: &'static str,
    pub arg_types: &'static [Type],
    pub ret_type: Type,
}

impl PartialEq for FunctionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for FunctionHandle {}

/// The tagged union itself. See module docs.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i32),
    IntPair(IntPair),
    Nesw(Nesw),
    Vector(Vec<i32>),
    Grid(Grid),
    MaskedGrid(Grid, Mask),
    GridTuple(Vec<Grid>),
    Function(FunctionHandle),
    /// Carries a diagnostic string; produced by primitives on precondition
    /// violations and by the VM on faults.
    Error(String),
    /// Sentinel for compile/run success with no other payload.
    NoError,
}

impl Value {
    /// The value's tag. Never `Type::Core` or `Type::Nothing` — those are
    /// signature-only pseudo-tags.
    pub fn tag(&self) -> Type {
        match self {
            Value::Integer(_) => Type::Integer,
            Value::IntPair(_) => Type::IntPair,
            Value::Nesw(_) => Type::Nesw,
            Value::Vector(_) => Type::Vector,
            Value::Grid(_) => Type::Grid,
            Value::MaskedGrid(_, _) => Type::MaskedGrid,
            Value::GridTuple(_) => Type::GridTuple,
            Value::Function(_) => Type::Function,
            Value::Error(_) => Type::Error,
            Value::NoError => Type::NoError,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn as_grid(&self) -> Option<&Grid> {
        match self {
            Value::Grid(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_grid_tuple(&self) -> Option<&[Grid]> {
        match self {
            Value::GridTuple(gs) => Some(gs),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[i32]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_pair(&self) -> Option<IntPair> {
        match self {
            Value::IntPair(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_nesw(&self) -> Option<Nesw> {
        match self {
            Value::Nesw(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_masked_grid(&self) -> Option<(&Grid, &Mask)> {
        match self {
            Value::MaskedGrid(g, m) => Some((g, m)),
            _ => None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Value {
        Value::Error(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_roundtrips_for_every_variant() {
        assert_eq!(Value::Integer(3).tag(), Type::Integer);
        assert_eq!(Value::Error("x".into()).tag(), Type::Error);
        assert_eq!(Value::NoError.tag(), Type::NoError);
    }

    #[test]
    fn function_handle_equality_is_by_name() {
        let a = FunctionHandle { name: "pic_rotate_90ccw", arg_types: &[Type::Grid], ret_type: Type::Grid };
        let b = FunctionHandle { name: "pic_rotate_90ccw", arg_types: &[], ret_type: Type::Integer };
        assert_eq!(a, b);
    }
}
