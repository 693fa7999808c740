//! The stack machine: executes one program against one VM state.
//!
//! Grounded on the original interpreter's `execute()`/`hcf()` pair: a
//! program is walked block by block, a function pops its declared argument
//! types off the stack (core functions additionally see the VM state), and
//! any precondition violation halts the run by pushing a diagnostic `Error`
//! value and latching the state's fault flag. Exposed as a stepping
//! iterator rather than the original's generator, per the design notes'
//! "iterator-as-generator" guidance.

use crate::primitives::PrimitiveRegistry;
use arc_synth_core::{Grid, Type, Value};
use std::collections::HashMap;
use tracing::{debug, trace};

/// The seven named register slots a `VmState` may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    A,
    B,
    C,
    D,
    E,
    Question,
    Answer,
}

impl Register {
    pub fn name(self) -> &'static str {
        match self {
            Register::A => "a",
            Register::B => "b",
            Register::C => "c",
            Register::D => "d",
            Register::E => "e",
            Register::Question => "question",
            Register::Answer => "answer",
        }
    }
}

/// One VM state: a stack, a register file, the grid-history accumulator,
/// and the fault latch. Created by `VmState::new`/`clear`-equivalents in
/// `crate::multicore`, mutated only by `execute`/`execute_step`.
#[derive(Debug, Clone)]
pub struct VmState {
    pub stack: Vec<Value>,
    registers: HashMap<Register, Value>,
    pub produced_grids: Vec<Grid>,
    pub ok: bool,
    pub error_msg: Option<String>,
}

impl Default for VmState {
    fn default() -> Self {
        Self::new()
    }
}

impl VmState {
    pub fn new() -> Self {
        VmState {
            stack: Vec::new(),
            registers: HashMap::new(),
            produced_grids: Vec::new(),
            ok: true,
            error_msg: None,
        }
    }

    pub fn get_register(&self, reg: Register) -> Option<&Value> {
        self.registers.get(&reg)
    }

    pub fn set_register(&mut self, reg: Register, value: Value) {
        self.registers.insert(reg, value);
    }

    pub fn clear_registers(&mut self) {
        self.registers.clear();
    }

    /// "halt and catch fire": latch the fault, record the diagnostic, and
    /// push it as the new top-of-stack value. Idempotent after the first
    /// call within one step (later calls just overwrite the message).
    pub fn hcf(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        debug!(error = %msg, "vm fault");
        self.ok = false;
        self.error_msg = Some(msg.clone());
        self.stack.push(Value::Error(msg));
    }

    /// Two-level deep copy: the `Vec`/`HashMap` container shells are
    /// cloned, leaf `Value`s are logically immutable and may be shared by
    /// value-clone (primitives never mutate in place, so a `Value::clone`
    /// is cheap and safe to treat as a snapshot).
    pub fn snapshot(&self) -> VmState {
        self.clone()
    }

    pub fn restore(&mut self, snapshot: &VmState) {
        *self = snapshot.clone();
    }
}

/// Execute one block (a constant or a function handle) against `state`.
/// Returns the resulting top-of-stack value, or `None` if `state` was
/// already faulted before this call (no further blocks run once faulted).
pub fn execute_step(state: &mut VmState, registry: &PrimitiveRegistry, block: &Value) -> Option<Value> {
    if !state.ok {
        return None;
    }
    match block {
        Value::Function(handle) => {
            trace!(op = handle.name, "execute");
            let prim = registry
                .get(handle.name)
                .unwrap_or_else(|| panic!("unresolved primitive: {}", handle.name));
            let mut args: Vec<Value> = Vec::with_capacity(prim.arg_types.len());
            for ty in prim.arg_types {
                if *ty == Type::Core {
                    continue;
                }
                match state.stack.pop() {
                    None => {
                        state.hcf("Empty stack while unpacking arguments");
                        return Some(state.stack.last().cloned().unwrap());
                    }
                    Some(v) => {
                        if v.tag() != *ty {
                            state.hcf(format!(
                                "Invalid Block type unpacked: expected {}, got {}",
                                ty,
                                v.tag()
                            ));
                            return Some(state.stack.last().cloned().unwrap());
                        }
                        args.push(v);
                    }
                }
            }
            let ret = prim.call(state, &args);
            if !state.ok {
                return Some(state.stack.last().cloned().unwrap());
            }
            match ret {
                None => {
                    if prim.ret_type != Type::Nothing {
                        state.hcf("Unexpected nothing return");
                        return Some(state.stack.last().cloned().unwrap());
                    }
                }
                Some(v) => {
                    if let Value::Error(msg) = &v {
                        state.hcf(msg.clone());
                        return Some(state.stack.last().cloned().unwrap());
                    }
                    if v.tag() != prim.ret_type {
                        state.hcf(format!(
                            "Invalid Block type returned: expected {}, got {}",
                            prim.ret_type,
                            v.tag()
                        ));
                        return Some(state.stack.last().cloned().unwrap());
                    }
                    state.stack.push(v);
                }
            }
        }
        constant => state.stack.push(constant.clone()),
    }
    if state.stack.is_empty() {
        state.hcf("Empty stack after execution");
        return Some(state.stack.last().cloned().unwrap());
    }
    state.stack.last().cloned()
}

/// Run every block of `program` against `state` in order, stopping early on
/// the first fault. Returns the final top-of-stack value, if any block ran.
///
/// Appends the final value to `state.produced_grids` exactly once, iff it is
/// grid-typed — this is a completed execution's contribution to the
/// history, not a per-opcode accumulator. Multi-opcode
/// programs (whole code items, whole solutions) contribute at most one
/// grid per call; callers that need per-opcode bookkeeping (the fragment
/// miner) track it themselves via `execute_step`/`StepIter`, not this field.
pub fn execute(state: &mut VmState, registry: &PrimitiveRegistry, program: &[Value]) -> Option<Value> {
    let mut last = None;
    for block in program {
        match execute_step(state, registry, block) {
            Some(v) => last = Some(v),
            None => break,
        }
    }
    if let Some(Value::Grid(g)) = &last {
        state.produced_grids.push(g.clone());
    }
    last
}

/// A stepping iterator over one program's execution against one state,
/// yielding the result after each block and stopping once faulted — the
/// direct Rust counterpart of the original generator-based `execute()`.
pub struct StepIter<'a, 'p> {
    state: &'a mut VmState,
    registry: &'a PrimitiveRegistry,
    program: std::slice::Iter<'p, Value>,
    done: bool,
}

impl<'a, 'p> StepIter<'a, 'p> {
    pub fn new(state: &'a mut VmState, registry: &'a PrimitiveRegistry, program: &'p [Value]) -> Self {
        StepIter { state, registry, program: program.iter(), done: false }
    }
}

impl<'a, 'p> Iterator for StepIter<'a, 'p> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if self.done {
            return None;
        }
        let block = self.program.next()?;
        match execute_step(self.state, self.registry, block) {
            Some(v) => {
                if !self.state.ok {
                    self.done = true;
                }
                Some(v)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::default_registry;

    #[test]
    fn pushes_constants_verbatim() {
        let registry = default_registry();
        let mut state = VmState::new();
        execute(&mut state, &registry, &[Value::Integer(3)]);
        assert_eq!(state.stack, vec![Value::Integer(3)]);
        assert!(state.ok);
    }

    #[test]
    fn underflow_faults_and_pushes_error() {
        let registry = default_registry();
        let mut state = VmState::new();
        let handle = registry.get("pic_rotate_90ccw").unwrap().handle();
        execute(&mut state, &registry, &[Value::Function(handle)]);
        assert!(!state.ok);
        assert!(matches!(state.stack.last(), Some(Value::Error(_))));
    }

    #[test]
    fn step_iter_stops_after_fault() {
        let registry = default_registry();
        let mut state = VmState::new();
        let handle = registry.get("pic_rotate_90ccw").unwrap().handle();
        let program = vec![Value::Function(handle.clone()), Value::Function(handle)];
        let results: Vec<_> = StepIter::new(&mut state, &registry, &program).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Value::Error(_)));
    }
}
