//! Error type for corpus I/O, plus the reward-model training-data builder
//! and its own small text format. Grounded on `CodeBase.py`'s exceptions and
//! `CodeGen.py::build_reward_training_data`/`train_reward_function`'s file
//! format.

use crate::codebase::CodeBase;
use crate::fragment::stack_npic;
use crate::problem::Problem;
use arc_synth_runtime::eval::{EVAL_FULL_MATCH, IDX_PIC_REACH_MAX};
use arc_synth_runtime::{eval_code, CompileError, Multicore, PrimitiveRegistry, Value, LENGTH_CODE_EVAL};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;

/// Every way loading or building a code base or its training data can fail.
#[derive(Debug, Clone, PartialEq)]
pub enum HarnessError {
    InvalidHeader(String),
    InvalidEnding,
    NameTooShort(String),
    DuplicateName(String),
    MissingSample(String),
    Compile(CompileError),
    MalformedRewardRow(String),
    Io(String),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::InvalidHeader(h) => write!(f, "invalid code base header: {h}"),
            HarnessError::InvalidEnding => write!(f, "code base ended without .eof."),
            HarnessError::NameTooShort(n) => write!(f, "snippet name too short (must be at least 3 characters): {n}"),
            HarnessError::DuplicateName(n) => write!(f, "duplicate snippet name: {n}"),
            HarnessError::MissingSample(n) => write!(f, "snippet {n} has no sample picture"),
            HarnessError::Compile(e) => write!(f, "{e}"),
            HarnessError::MalformedRewardRow(line) => write!(f, "malformed reward training row: {line}"),
            HarnessError::Io(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for HarnessError {}

impl From<CompileError> for HarnessError {
    fn from(e: CompileError) -> Self {
        HarnessError::Compile(e)
    }
}

impl From<std::io::Error> for HarnessError {
    fn from(e: std::io::Error) -> Self {
        HarnessError::Io(e.to_string())
    }
}

/// One labelled row of the reward classifier's training data: a known-good
/// (`label = 1`) or known-bad (`label = 0`) evaluation vector.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardRow {
    pub label: u8,
    pub eval: [f64; LENGTH_CODE_EVAL],
}

/// Parses the `.priorTRN: <name>` text format: a header line, one
/// `"<label>, v0, ..., v17"` line per row, and an `.eof.` footer.
pub fn parse_reward_training_data(text: &str) -> Result<Vec<RewardRow>, HarnessError> {
    let mut lines = text.lines();
    let header = lines.next().ok_or_else(|| HarnessError::InvalidHeader(String::new()))?;
    if !header.starts_with(".priorTRN") {
        return Err(HarnessError::InvalidHeader(header.to_string()));
    }

    let mut rows = Vec::new();
    let mut terminated = false;
    for line in lines {
        if line == ".eof." {
            terminated = true;
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(',').map(|p| p.trim()).collect();
        if parts.len() != LENGTH_CODE_EVAL + 1 {
            return Err(HarnessError::MalformedRewardRow(line.to_string()));
        }
        let label: u8 = parts[0].parse().map_err(|_| HarnessError::MalformedRewardRow(line.to_string()))?;
        let mut eval = [0.0f64; LENGTH_CODE_EVAL];
        for (slot, p) in eval.iter_mut().zip(&parts[1..]) {
            *slot = p.parse().map_err(|_| HarnessError::MalformedRewardRow(line.to_string()))?;
        }
        rows.push(RewardRow { label, eval });
    }

    if !terminated {
        return Err(HarnessError::InvalidEnding);
    }
    Ok(rows)
}

/// Renders rows back to the `.priorTRN` format `parse_reward_training_data`
/// reads.
pub fn render_reward_training_data(name: &str, rows: &[RewardRow]) -> String {
    let mut out = format!(".priorTRN: {name}\n");
    for row in rows {
        out.push_str(&row.label.to_string());
        for v in &row.eval {
            out.push_str(", ");
            out.push_str(&v.to_string());
        }
        out.push('\n');
    }
    out.push_str(".eof.\n");
    out
}

fn is_sto(op: &Value) -> bool {
    matches!(op, Value::Function(h) if matches!(h.name, "sto_a" | "sto_b" | "sto_c" | "sto_d" | "sto_e"))
}

fn is_get_or_swap(op: &Value) -> bool {
    matches!(op, Value::Function(h) if crate::fragment::is_get_or_swap_name(h.name))
}

/// Builds reward-classifier training data from a corpus of known solutions
/// matched to their problems: one positive row per cut boundary inside each
/// known solution (it is, by construction, always making progress at those
/// boundaries), and up to two negative rows per solution from running it
/// against unrelated problems, keeping only rows that fall short of a full
/// match. Grounded on `CodeGen.py::build_reward_training_data`, including
/// its `random.seed`-style determinism (here, an explicit seed rather than
/// a process-global one).
pub fn build_reward_training_data(
    code_base: &CodeBase,
    problems: &[(String, Problem)],
    registry: &PrimitiveRegistry,
    rng_seed: u64,
) -> Vec<RewardRow> {
    let mut rng = StdRng::seed_from_u64(rng_seed);
    let mut rows = Vec::new();

    for entry in code_base.iter() {
        let Some((_, problem)) = problems.iter().find(|(name, _)| name == &entry.name) else {
            continue;
        };

        let (demo, tests) = problem.multicore_inputs();
        let mut mc = Multicore::clear(&demo, &tests);

        let mut last_op: Option<Value> = None;
        let mut l_stack_npic: i64 = 0;

        for opcode in &entry.program {
            let last_is_function = matches!(&last_op, Some(Value::Function(_)));
            let last_is_get_or_swap = matches!(&last_op, Some(op) if is_get_or_swap(op));
            let opcode_is_sto = is_sto(opcode);

            if l_stack_npic > 0 && !opcode_is_sto && !last_is_get_or_swap && last_is_function {
                if let Some(eval) = eval_code(&mc) {
                    rows.push(RewardRow { label: 1, eval });
                }
            }

            mc.run_all(std::slice::from_ref(opcode), registry, true);
            l_stack_npic = stack_npic(&mc.states()[0].stack);
            last_op = Some(opcode.clone());
        }
        if let Some(eval) = eval_code(&mc) {
            rows.push(RewardRow { label: 1, eval });
        }

        let others: Vec<&(String, Problem)> = problems.iter().filter(|(name, _)| name != &entry.name).collect();
        let picked: Vec<&&(String, Problem)> = others.choose_multiple(&mut rng, others.len().min(2)).collect();
        for (_, other) in picked.into_iter().map(|p| *p) {
            let (demo, tests) = other.multicore_inputs();
            let mut mc = Multicore::clear(&demo, &tests);
            mc.run_all(&entry.program, registry, true);
            if let Some(eval) = eval_code(&mc) {
                if eval[IDX_PIC_REACH_MAX] < EVAL_FULL_MATCH {
                    rows.push(RewardRow { label: 0, eval });
                }
            }
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_header_missing_the_priortrn_prefix() {
        let err = parse_reward_training_data("not a header\n.eof.\n").unwrap_err();
        assert_eq!(err, HarnessError::InvalidHeader("not a header".to_string()));
    }

    #[test]
    fn rejects_a_row_with_the_wrong_number_of_fields() {
        let text = ".priorTRN: demo\n1, 0.5\n.eof.\n";
        let err = parse_reward_training_data(text).unwrap_err();
        assert!(matches!(err, HarnessError::MalformedRewardRow(_)));
    }

    #[test]
    fn rejects_text_with_no_eof_marker() {
        let text = ".priorTRN: demo\n1, 0.0, 0.0\n";
        let err = parse_reward_training_data(text).unwrap_err();
        assert_eq!(err, HarnessError::InvalidEnding);
    }

    #[test]
    fn round_trips_rows_through_render_and_parse() {
        let rows = vec![RewardRow { label: 1, eval: [0.25; LENGTH_CODE_EVAL] }];
        let text = render_reward_training_data("demo", &rows);
        let back = parse_reward_training_data(&text).unwrap();
        assert_eq!(back, rows);
    }
}
