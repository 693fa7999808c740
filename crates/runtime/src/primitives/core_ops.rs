//! Register I/O and tuple-unpacker primitives. Grounded on `Bebop.py`'s
//! `bebop_get_*`/`bebop_sto_*`/`bebop_swap_top*`/`bebop_pics_as_*` methods.
//! All are "core" primitives: they see `&mut VmState` and push/fault
//! directly rather than returning a value for the executor to push.

use super::{Primitive, PrimitiveRegistry};
use crate::vm::{Register, VmState};
use arc_synth_core::{Type, Value};

fn get_register(state: &mut VmState, reg: Register) -> Option<Value> {
    match state.get_register(reg) {
        Some(v) => {
            let v = v.clone();
            state.stack.push(v);
            None
        }
        None => {
            state.hcf(format!("get_{}() empty register", reg.name()));
            None
        }
    }
}

fn sto_register(state: &mut VmState, reg: Register) -> Option<Value> {
    match state.stack.last() {
        Some(v) => {
            let v = v.clone();
            state.set_register(reg, v);
            None
        }
        None => {
            state.hcf(format!("sto_{}() empty stack", reg.name()));
            None
        }
    }
}

fn unpack_tuple(state: &mut VmState, args: &[Value], expected_len: usize, opcode: &str) -> Option<Value> {
    match &args[0] {
        Value::GridTuple(grids) if grids.len() == expected_len => {
            for g in grids {
                state.stack.push(Value::Grid(g.clone()));
            }
            None
        }
        _ => {
            state.hcf(format!("{opcode}() tuple of {expected_len} picture(s) expected"));
            None
        }
    }
}

pub fn register(reg: &mut PrimitiveRegistry) {
    reg.register(Primitive::core("get_a", &[Type::Core], Type::Nothing, |s, _| get_register(s, Register::A)));
    reg.register(Primitive::core("get_b", &[Type::Core], Type::Nothing, |s, _| get_register(s, Register::B)));
    reg.register(Primitive::core("get_c", &[Type::Core], Type::Nothing, |s, _| get_register(s, Register::C)));
    reg.register(Primitive::core("get_d", &[Type::Core], Type::Nothing, |s, _| get_register(s, Register::D)));
    reg.register(Primitive::core("get_e", &[Type::Core], Type::Nothing, |s, _| get_register(s, Register::E)));
    reg.register(Primitive::core("get_question", &[Type::Core], Type::Nothing, |s, _| {
        get_register(s, Register::Question)
    }));
    reg.register(Primitive::core("get_answer", &[Type::Core], Type::Nothing, |s, _| {
        get_register(s, Register::Answer)
    }));

    reg.register(Primitive::core("sto_a", &[Type::Core], Type::Nothing, |s, _| sto_register(s, Register::A)));
    reg.register(Primitive::core("sto_b", &[Type::Core], Type::Nothing, |s, _| sto_register(s, Register::B)));
    reg.register(Primitive::core("sto_c", &[Type::Core], Type::Nothing, |s, _| sto_register(s, Register::C)));
    reg.register(Primitive::core("sto_d", &[Type::Core], Type::Nothing, |s, _| sto_register(s, Register::D)));
    reg.register(Primitive::core("sto_e", &[Type::Core], Type::Nothing, |s, _| sto_register(s, Register::E)));

    reg.register(Primitive::core("swap_top2", &[Type::Core], Type::Nothing, |s, _| {
        let len = s.stack.len();
        if len < 2 {
            s.hcf("swap_top2() with less than two");
        } else {
            s.stack.swap(len - 1, len - 2);
        }
        None
    }));
    reg.register(Primitive::core("swap_top3", &[Type::Core], Type::Nothing, |s, _| {
        let len = s.stack.len();
        if len < 3 {
            s.hcf("swap_top3() with less than three");
        } else {
            s.stack.swap(len - 1, len - 3);
        }
        None
    }));

    reg.register(Primitive::core("pics_as_2pic", &[Type::Core, Type::GridTuple], Type::Nothing, |s, a| {
        unpack_tuple(s, a, 2, "pics_as_2pic")
    }));
    reg.register(Primitive::core("pics_as_3pic", &[Type::Core, Type::GridTuple], Type::Nothing, |s, a| {
        unpack_tuple(s, a, 3, "pics_as_3pic")
    }));
    reg.register(Primitive::core("pics_as_pic", &[Type::Core, Type::GridTuple], Type::Nothing, |s, a| {
        unpack_tuple(s, a, 1, "pics_as_pic")
    }));
}
