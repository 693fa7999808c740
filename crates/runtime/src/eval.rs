//! The 18-float evaluation vector MCTS expansion scores a move by.
//! Grounded on `CodeEval.py::eval_code` and `SearchConf.py`'s index/sentinel
//! constants, which are reproduced verbatim (these are read by name
//! throughout `search::mcts`/`search::engine`, so the numeric layout is a
//! wire contract, not an implementation detail).

use crate::multicore::Multicore;

pub const EVAL_FULL_MATCH: f64 = 5.0;
pub const EVAL_WRONG_SHAPE: f64 = -5.0;
pub const EVAL_MAX_PIC_SIZE: usize = 40;

pub const IDX_PIC_REACH_MIN: usize = 0;
pub const IDX_PIC_BETTER_MIN: usize = 1;
pub const IDX_PIC_WORSE_MIN: usize = 2;
pub const IDX_PAT_REACH_MIN: usize = 3;
pub const IDX_PAT_BETTER_MIN: usize = 4;
pub const IDX_PAT_WORSE_MIN: usize = 5;

pub const IDX_PIC_REACH_MEAN: usize = 6;
pub const IDX_PIC_BETTER_MEAN: usize = 7;
pub const IDX_PIC_WORSE_MEAN: usize = 8;
pub const IDX_PAT_REACH_MEAN: usize = 9;
pub const IDX_PAT_BETTER_MEAN: usize = 10;
pub const IDX_PAT_WORSE_MEAN: usize = 11;

pub const IDX_PIC_REACH_MAX: usize = 12;
pub const IDX_PIC_BETTER_MAX: usize = 13;
pub const IDX_PIC_WORSE_MAX: usize = 14;
pub const IDX_PAT_REACH_MAX: usize = 15;
pub const IDX_PAT_BETTER_MAX: usize = 16;
pub const IDX_PAT_WORSE_MAX: usize = 17;

pub const LENGTH_CODE_EVAL: usize = 18;

/// Evaluates the current multicore state: how close each training example's
/// produced picture got to its known answer, both in absolute terms
/// (`reach`) and relative to the previous step (`better`/`worse`), each
/// folded over {picture-exact, pattern-only} x {min, mean, max} across
/// every training example. Held-out test lanes (no `answer` register) are
/// skipped — the original stops at the first lane without one, since demo
/// lanes are always built before test lanes by `Multicore::clear`.
///
/// Returns `None` if no training lane had a produced picture yet (the
/// original's `LookupError`, not a legal search state).
pub fn eval_code(mc: &Multicore) -> Option<[f64; LENGTH_CODE_EVAL]> {
    let mut eval = [0.0; LENGTH_CODE_EVAL];
    for i in 0..6 {
        eval[i] = 9e9;
    }
    for i in 12..18 {
        eval[i] = -9e9;
    }

    let mut n_ex = 0u32;

    for (state, pic_list) in mc.states().iter().zip(mc.pic_lists().iter()).take(mc.num_demo()) {
        let answer = match state.get_register(crate::vm::Register::Answer) {
            Some(arc_synth_core::Value::Grid(g)) => g,
            _ => break,
        };
        let question = match state.get_register(crate::vm::Register::Question) {
            Some(arc_synth_core::Value::Grid(g)) => g,
            _ => break,
        };

        let (pic_t1, pic_t2) = match pic_list.len() {
            n if n >= 2 => (&pic_list[n - 2], &pic_list[n - 1]),
            1 => (question, &pic_list[0]),
            _ => return None,
        };
        let pic_t3 = answer;

        let (pic_reach, pic_better, pic_worse, pat_reach, pat_better, pat_worse);

        if pic_t2.shape() != pic_t3.shape() {
            if pic_t2.rows() > EVAL_MAX_PIC_SIZE || pic_t2.cols() > EVAL_MAX_PIC_SIZE {
                return None;
            }
            pic_reach = EVAL_WRONG_SHAPE;
            pic_better = EVAL_WRONG_SHAPE;
            pic_worse = EVAL_WRONG_SHAPE;
            pat_reach = EVAL_WRONG_SHAPE;
            pat_better = EVAL_WRONG_SHAPE;
            pat_worse = EVAL_WRONG_SHAPE;
        } else {
            let n_tot = (pic_t2.rows() * pic_t2.cols()) as f64;
            let n_equ = pic_t2.cells().iter().zip(pic_t3.cells()).filter(|(a, b)| a == b).count() as f64;
            pic_reach = if n_equ == n_tot { EVAL_FULL_MATCH } else { n_equ / n_tot };

            let n_equ_pat = pic_t2
                .cells()
                .iter()
                .zip(pic_t3.cells())
                .filter(|(a, b)| (**a != 0) == (**b != 0))
                .count() as f64;
            pat_reach = if n_equ_pat == n_tot { EVAL_FULL_MATCH } else { n_equ_pat / n_tot };

            if pic_t1.shape() != pic_t2.shape() {
                pic_better = EVAL_WRONG_SHAPE;
                pic_worse = EVAL_WRONG_SHAPE;
                pat_better = EVAL_WRONG_SHAPE;
                pat_worse = EVAL_WRONG_SHAPE;
            } else {
                let mut pb = 0usize;
                let mut pw = 0usize;
                let mut ptb = 0usize;
                let mut ptw = 0usize;
                for i in 0..pic_t2.cells().len() {
                    let was_ok = pic_t1.cells()[i] == pic_t3.cells()[i];
                    let is_ok = pic_t2.cells()[i] == pic_t3.cells()[i];
                    if is_ok && !was_ok {
                        pb += 1;
                    }
                    if was_ok && !is_ok {
                        pw += 1;
                    }
                    let pat_was_ok = (pic_t1.cells()[i] != 0) == (pic_t3.cells()[i] != 0);
                    let pat_is_ok = (pic_t2.cells()[i] != 0) == (pic_t3.cells()[i] != 0);
                    if pat_is_ok && !pat_was_ok {
                        ptb += 1;
                    }
                    if pat_was_ok && !pat_is_ok {
                        ptw += 1;
                    }
                }
                pic_better = pb as f64 / n_tot;
                pic_worse = pw as f64 / n_tot;
                pat_better = ptb as f64 / n_tot;
                pat_worse = ptw as f64 / n_tot;
            }
        }

        eval[IDX_PIC_REACH_MIN] = eval[IDX_PIC_REACH_MIN].min(pic_reach);
        eval[IDX_PIC_BETTER_MIN] = eval[IDX_PIC_BETTER_MIN].min(pic_better);
        eval[IDX_PIC_WORSE_MIN] = eval[IDX_PIC_WORSE_MIN].min(pic_worse);
        eval[IDX_PAT_REACH_MIN] = eval[IDX_PAT_REACH_MIN].min(pat_reach);
        eval[IDX_PAT_BETTER_MIN] = eval[IDX_PAT_BETTER_MIN].min(pat_better);
        eval[IDX_PAT_WORSE_MIN] = eval[IDX_PAT_WORSE_MIN].min(pat_worse);

        eval[IDX_PIC_REACH_MEAN] += pic_reach;
        eval[IDX_PIC_BETTER_MEAN] += pic_better;
        eval[IDX_PIC_WORSE_MEAN] += pic_worse;
        eval[IDX_PAT_REACH_MEAN] += pat_reach;
        eval[IDX_PAT_BETTER_MEAN] += pat_better;
        eval[IDX_PAT_WORSE_MEAN] += pat_worse;

        eval[IDX_PIC_REACH_MAX] = eval[IDX_PIC_REACH_MAX].max(pic_reach);
        eval[IDX_PIC_BETTER_MAX] = eval[IDX_PIC_BETTER_MAX].max(pic_better);
        eval[IDX_PIC_WORSE_MAX] = eval[IDX_PIC_WORSE_MAX].max(pic_worse);
        eval[IDX_PAT_REACH_MAX] = eval[IDX_PAT_REACH_MAX].max(pat_reach);
        eval[IDX_PAT_BETTER_MAX] = eval[IDX_PAT_BETTER_MAX].max(pat_better);
        eval[IDX_PAT_WORSE_MAX] = eval[IDX_PAT_WORSE_MAX].max(pat_worse);

        n_ex += 1;
    }

    if n_ex == 0 {
        return None;
    }

    let n_ex = n_ex as f64;
    eval[IDX_PIC_REACH_MEAN] /= n_ex;
    eval[IDX_PIC_BETTER_MEAN] /= n_ex;
    eval[IDX_PIC_WORSE_MEAN] /= n_ex;
    eval[IDX_PAT_REACH_MEAN] /= n_ex;
    eval[IDX_PAT_BETTER_MEAN] /= n_ex;
    eval[IDX_PAT_WORSE_MEAN] /= n_ex;

    Some(eval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::default_registry;
    use arc_synth_core::Grid;

    fn g(rows: Vec<Vec<i32>>) -> Grid {
        Grid::from_rows(rows).unwrap()
    }

    #[test]
    fn full_match_hits_the_sentinel_not_one_point_zero() {
        let reg = default_registry();
        let demo = vec![(g(vec![vec![1, 2]]), g(vec![vec![2], vec![1]]))];
        let mut mc = Multicore::clear(&demo, &[]);
        let prog = vec![
            question_value(&reg),
            arc_synth_core::Value::Function(reg.get("pic_rotate_90ccw").unwrap().handle()),
        ];
        mc.run_all(&prog, &reg, false);
        let eval = eval_code(&mc).unwrap();
        assert_eq!(eval[IDX_PIC_REACH_MIN], EVAL_FULL_MATCH);
        assert_eq!(eval[IDX_PAT_REACH_MIN], EVAL_FULL_MATCH);
    }

    #[test]
    fn shape_mismatch_scores_the_wrong_shape_sentinel() {
        let reg = default_registry();
        let demo = vec![(g(vec![vec![1]]), g(vec![vec![1, 1]]))];
        let mut mc = Multicore::clear(&demo, &[]);
        let prog = vec![question_value(&reg)];
        mc.run_all(&prog, &reg, false);
        let eval = eval_code(&mc).unwrap();
        assert_eq!(eval[IDX_PIC_REACH_MIN], EVAL_WRONG_SHAPE);
    }

    fn question_value(reg: &crate::primitives::PrimitiveRegistry) -> arc_synth_core::Value {
        arc_synth_core::Value::Function(reg.get("get_question").unwrap().handle())
    }
}
