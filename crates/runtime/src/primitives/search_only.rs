//! Search-only primitives: visible to the harness/MCTS driver but excluded
//! from the default compile/decompile opcode table (`crate::compile`)
//! because they peek at the `answer` register, which only exists while
//! training/searching against a known solution. Grounded on `BopBack.py`.

use super::{Primitive, PrimitiveRegistry};
use crate::vm::{Register, VmState};
use arc_synth_core::{Type, Value};

pub fn register(reg: &mut PrimitiveRegistry) {
    reg.register(Primitive::core("tests_verify_answer", &[Type::Core], Type::Integer, |s, _| {
        let hit = match (s.get_register(Register::Answer), s.stack.last()) {
            (Some(Value::Grid(answer)), Some(Value::Grid(pic))) => pic == answer,
            _ => false,
        };
        Some(Value::Integer(hit as i32))
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::default_registry;
    use arc_synth_core::Grid;

    #[test]
    fn matches_identical_grid_against_answer_register() {
        let reg = default_registry();
        let prim = reg.get("tests_verify_answer").unwrap();
        let g = Grid::from_rows(vec![vec![1, 2]]).unwrap();
        let mut state = VmState::new();
        state.set_register(Register::Answer, Value::Grid(g.clone()));
        state.stack.push(Value::Grid(g));
        let ret = prim.call(&mut state, &[]);
        assert_eq!(ret, Some(Value::Integer(1)));
    }

    #[test]
    fn no_answer_register_set_is_a_miss_not_a_fault() {
        let reg = default_registry();
        let prim = reg.get("tests_verify_answer").unwrap();
        let mut state = VmState::new();
        state.stack.push(Value::Grid(Grid::from_rows(vec![vec![0]]).unwrap()));
        let ret = prim.call(&mut state, &[]);
        assert_eq!(ret, Some(Value::Integer(0)));
        assert!(state.ok);
    }
}
