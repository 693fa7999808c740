//! Runs one code item against every training/test example at once: the
//! "multicore" parallel-by-example executor the search engine walks a tree
//! over. Grounded on `CodeEval.py`'s `multicore_*` methods — "core" here
//! means "one example's VM lane", unrelated to OS threads; every lane runs
//! in turn on the calling thread, no concurrency primitives involved.

use crate::primitives::PrimitiveRegistry;
use crate::vm::{execute, Register, VmState};
use arc_synth_core::{Grid, Value};

/// One lane per example: a demo pair contributes `question`+`answer`
/// registers, a test question contributes `question` only (its `answer`
/// register stays empty so the VM can't peek at it while searching).
#[derive(Debug, Clone)]
pub struct Multicore {
    states: Vec<VmState>,
    pic_lists: Vec<Vec<Grid>>,
    num_demo: usize,
}

impl Multicore {
    /// `demo` is `(question, answer)` training pairs; `tests` are held-out
    /// questions with no answer register set (`CodeEval.py::multicore_clear`).
    pub fn clear(demo: &[(Grid, Grid)], tests: &[Grid]) -> Self {
        let mut states = Vec::with_capacity(demo.len() + tests.len());
        let mut pic_lists = Vec::with_capacity(demo.len() + tests.len());

        for (q, a) in demo {
            let mut s = VmState::new();
            s.set_register(Register::Question, Value::Grid(q.clone()));
            s.set_register(Register::Answer, Value::Grid(a.clone()));
            states.push(s);
            pic_lists.push(Vec::new());
        }
        for q in tests {
            let mut s = VmState::new();
            s.set_register(Register::Question, Value::Grid(q.clone()));
            states.push(s);
            pic_lists.push(Vec::new());
        }

        Multicore { states, pic_lists, num_demo: demo.len() }
    }

    pub fn num_demo(&self) -> usize {
        self.num_demo
    }

    pub fn pic_lists(&self) -> &[Vec<Grid>] {
        &self.pic_lists
    }

    pub fn states(&self) -> &[VmState] {
        &self.states
    }

    /// Run `program` on every lane in turn, stacks and registers carried
    /// over from any previous call (lanes are never auto-reset between
    /// calls; `clear` is the only reset). Stops at the first lane whose run
    /// faults or returns something other than a picture, returning that
    /// value; returns `Value::NoError` if every lane ran clean.
    ///
    /// `ignore_ret_type`: when true, a non-picture clean result is kept
    /// without being appended to that lane's `pic_list` and without
    /// faulting — used by the fragment miner, which runs sub-programs that
    /// don't necessarily end on a picture.
    pub fn run_all(&mut self, program: &[Value], registry: &PrimitiveRegistry, ignore_ret_type: bool) -> Value {
        for (state, pic_list) in self.states.iter_mut().zip(self.pic_lists.iter_mut()) {
            let ret = execute(state, registry, program);
            match ret {
                None => return Value::error("Try/catch caught an exception"),
                Some(v) => {
                    if !state.ok {
                        return v;
                    }
                    match &v {
                        Value::Grid(g) => pic_list.push(g.clone()),
                        _ if !ignore_ret_type => {
                            return Value::error("Code item does not return a picture");
                        }
                        _ => {}
                    }
                }
            }
        }
        Value::NoError
    }

    /// Two-level deep copy: `Vec<VmState>`/`Vec<Vec<Grid>>` container
    /// shells are cloned, leaf values shared by value-clone (see
    /// `VmState::snapshot`'s doc comment for why that's safe and cheap).
    pub fn snapshot(&self) -> Multicore {
        self.clone()
    }

    pub fn restore(&mut self, snapshot: &Multicore) {
        *self = snapshot.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::default_registry;

    fn g(rows: Vec<Vec<i32>>) -> Grid {
        Grid::from_rows(rows).unwrap()
    }

    #[test]
    fn run_all_appends_picture_results_per_lane() {
        let reg = default_registry();
        let demo = vec![(g(vec![vec![1, 2]]), g(vec![vec![2], vec![1]]))];
        let mut mc = Multicore::clear(&demo, &[]);
        let prog = vec![Value::Function(reg.get("get_question").unwrap().handle())];
        let ret = mc.run_all(&prog, &reg, false);
        assert_eq!(ret, Value::NoError);
        assert_eq!(mc.pic_lists()[0].len(), 1);
    }

    #[test]
    fn run_all_short_circuits_on_fault() {
        let reg = default_registry();
        let demo = vec![(g(vec![vec![1]]), g(vec![vec![1]]))];
        let mut mc = Multicore::clear(&demo, &[]);
        let handle = reg.get("pic_rotate_90ccw").unwrap().handle();
        let ret = mc.run_all(&[Value::Function(handle)], &reg, false);
        assert!(ret.is_error());
    }

    #[test]
    fn snapshot_and_restore_are_independent() {
        let reg = default_registry();
        let demo = vec![(g(vec![vec![1]]), g(vec![vec![1]]))];
        let mut mc = Multicore::clear(&demo, &[]);
        let snap = mc.snapshot();
        let prog = vec![Value::Function(reg.get("get_question").unwrap().handle())];
        mc.run_all(&prog, &reg, false);
        assert_eq!(mc.pic_lists()[0].len(), 1);
        assert_eq!(snap.pic_lists()[0].len(), 0);
    }
}
