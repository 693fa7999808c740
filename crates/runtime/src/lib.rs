//! Stack VM, primitive catalogue, multicore executor, evaluator, reward
//! model and textual compiler for the ARC grid-program synthesis engine.
//!
//! `vm`/`primitives` give you one VM state and the ~80 opcodes it can run.
//! `multicore` fans a program out over every training/test example at
//! once. `eval`/`reward` turn a multicore run into the scalar the search
//! engine climbs. `compile` turns the textual program grammar into the
//! `Value` sequence the VM executes, and back.

pub mod compile;
pub mod error;
pub mod eval;
pub mod multicore;
pub mod primitives;
pub mod reward;
pub mod vm;

pub use compile::{compile, decompile};
pub use error::CompileError;
pub use eval::{eval_code, LENGTH_CODE_EVAL};
pub use multicore::Multicore;
pub use primitives::{default_registry, PrimitiveRegistry};
pub use reward::{RewardClassifier, RewardModel};
pub use vm::{execute, execute_step, Register, VmState};
