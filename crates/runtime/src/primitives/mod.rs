//! The primitive catalogue: a fixed, typed, pure set of "opcodes" operating
//! on grids, plus the small "core" family that touches VM state directly.
//!
//! Grounded on `Bebop.py` (core family: register I/O, tuple unpackers) and
//! `BopForward.py` (the ~70-opcode grid DSL) — the original discovers
//! opcodes by reflection over prefix-matched method names; here they are an
//! explicit static registration table, per the design notes' guidance to
//! replace decorator/inheritance-based discovery with a plain `{name,
//! arg_types, ret_type, kind, body}` table.

mod analysis;
mod combine;
mod convert;
mod core_ops;
mod grid_ops;
mod morph;
mod search_only;

use crate::vm::VmState;
use arc_synth_core::{FunctionHandle, Type, Value};
use std::collections::HashMap;

/// Whether a primitive's first argument is the VM state itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// A pure function over `Value`s; cannot read/write the VM.
    Pure,
    /// Additionally receives `&mut VmState`; may push/pop/fault.
    Core,
}

enum Body {
    Pure(fn(&[Value]) -> Value),
    Core(fn(&mut VmState, &[Value]) -> Option<Value>),
}

/// One entry of the catalogue: a name, its declared signature, and its
/// implementation.
pub struct Primitive {
    pub name: &'static str,
    pub arg_types: &'static [Type],
    pub ret_type: Type,
    pub kind: PrimitiveKind,
    body: Body,
}

impl Primitive {
    fn pure(name: &'static str, arg_types: &'static [Type], ret_type: Type, f: fn(&[Value]) -> Value) -> Primitive {
        Primitive { name, arg_types, ret_type, kind: PrimitiveKind::Pure, body: Body::Pure(f) }
    }

    fn core(
        name: &'static str,
        arg_types: &'static [Type],
        ret_type: Type,
        f: fn(&mut VmState, &[Value]) -> Option<Value>,
    ) -> Primitive {
        Primitive { name, arg_types, ret_type, kind: PrimitiveKind::Core, body: Body::Core(f) }
    }

    pub fn handle(&self) -> FunctionHandle {
        FunctionHandle { name: self.name, arg_types: self.arg_types, ret_type: self.ret_type }
    }

    pub fn call(&self, state: &mut VmState, args: &[Value]) -> Option<Value> {
        match &self.body {
            Body::Pure(f) => Some(f(args)),
            Body::Core(f) => f(state, args),
        }
    }
}

/// Whether `name` identifies a register-read opcode (`get_*`), used by the
/// fragment miner's cut-rule classification: these are recognised by
/// `PrimitiveKind`/explicit membership, not a name-prefix string test, so
/// new primitives can't silently mis-classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeClass {
    RegisterRead,
    RegisterWrite,
    StackSwap,
    Other,
}

/// The full catalogue, keyed by name, with ret-type grouping for the
/// fragment miner's isomorphism search.
pub struct PrimitiveRegistry {
    by_name: HashMap<&'static str, Primitive>,
    by_ret_type: HashMap<Type, Vec<&'static str>>,
}

impl PrimitiveRegistry {
    fn new() -> Self {
        PrimitiveRegistry { by_name: HashMap::new(), by_ret_type: HashMap::new() }
    }

    fn register(&mut self, prim: Primitive) {
        let name = prim.name;
        let ret = prim.ret_type;
        if self.by_name.insert(name, prim).is_some() {
            panic!("duplicate primitive name: {name}");
        }
        self.by_ret_type.entry(ret).or_default().push(name);
    }

    pub fn get(&self, name: &str) -> Option<&Primitive> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &Primitive> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// All primitives declaring `ret_type`, for the miner's isomorphism
    /// substitution search: every other primitive of identical argument
    /// types and return type.
    pub fn by_ret_type(&self, ret_type: Type) -> Vec<&Primitive> {
        self.by_ret_type
            .get(&ret_type)
            .into_iter()
            .flatten()
            .filter_map(|name| self.by_name.get(name))
            .collect()
    }

    /// Classification used by the fragment miner's cut-rule: register
    /// reads, register writes ("stores"), and stack swaps are each
    /// enumerated explicitly rather than sniffed from the name.
    pub fn classify(&self, name: &str) -> OpcodeClass {
        match name {
            "get_a" | "get_b" | "get_c" | "get_d" | "get_e" | "get_question" | "get_answer" => {
                OpcodeClass::RegisterRead
            }
            "sto_a" | "sto_b" | "sto_c" | "sto_d" | "sto_e" => OpcodeClass::RegisterWrite,
            "swap_top2" | "swap_top3" => OpcodeClass::StackSwap,
            _ => OpcodeClass::Other,
        }
    }
}

/// Build the production catalogue: every primitive in every family,
/// including the answer-aware search-only family (excluded from
/// compile/decompile's default table but present for harness use — see
/// `crate::compile`).
pub fn default_registry() -> PrimitiveRegistry {
    let mut reg = PrimitiveRegistry::new();
    core_ops::register(&mut reg);
    combine::register(&mut reg);
    morph::register(&mut reg);
    analysis::register(&mut reg);
    convert::register(&mut reg);
    search_only::register(&mut reg);
    reg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_no_duplicate_names_and_is_substantial() {
        let reg = default_registry();
        assert!(reg.len() > 60, "expected the full ~70-opcode catalogue, got {}", reg.len());
    }

    #[test]
    fn classify_recognises_register_and_swap_ops() {
        let reg = default_registry();
        assert_eq!(reg.classify("get_a"), OpcodeClass::RegisterRead);
        assert_eq!(reg.classify("sto_b"), OpcodeClass::RegisterWrite);
        assert_eq!(reg.classify("swap_top2"), OpcodeClass::StackSwap);
        assert_eq!(reg.classify("pic_rotate_90ccw"), OpcodeClass::Other);
    }
}
