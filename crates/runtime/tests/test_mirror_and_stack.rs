//! End-to-end scenario: mirror a question grid left-right and concatenate
//! it with the original on both sides, the shape of program a "mirror and
//! stack" ARC solution takes (e.g. task 00576224).

use arc_synth_core::{Grid, Value};
use arc_synth_runtime::vm::{execute, Register, VmState};
use arc_synth_runtime::{default_registry, PrimitiveRegistry};

fn call(reg: &PrimitiveRegistry, s: &mut VmState, name: &str) {
    let prog = [Value::Function(reg.get(name).unwrap().handle())];
    execute(s, reg, &prog).unwrap();
}

#[test]
fn mirrored_row_tiles_left_and_right_of_the_original() {
    let reg = default_registry();
    let mut s = VmState::new();
    let question = Grid::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
    s.set_register(Register::Question, Value::Grid(question.clone()));

    call(&reg, &mut s, "get_question"); // stack: [question]
    call(&reg, &mut s, "pic_all_as_pat"); // stack: [pattern]
    call(&reg, &mut s, "pat_flip_left_right"); // stack: [flipped pattern]
    call(&reg, &mut s, "pat_as_pic"); // stack: [flipped]
    call(&reg, &mut s, "sto_a"); // register a = flipped, stack unchanged

    s.stack.push(Value::Grid(question.clone())); // stack: [flipped, question]
    call(&reg, &mut s, "get_a"); // stack: [flipped, question, flipped]
    call(&reg, &mut s, "2pic_cbind"); // stack: [flipped, question|flipped]

    s.stack.push(Value::Grid(question)); // stack: [flipped, question|flipped, question]
    call(&reg, &mut s, "2pic_cbind"); // stack: [flipped, (question|flipped)|question]

    let tiled = s.stack.pop().unwrap();
    let Value::Grid(g) = tiled else { panic!("expected a grid") };
    assert_eq!(g.shape(), (2, 9));
    assert_eq!(g.row(0), &[1, 2, 3, 3, 2, 1, 1, 2, 3]);
    assert_eq!(g.row(1), &[4, 5, 6, 6, 5, 4, 4, 5, 6]);
}
