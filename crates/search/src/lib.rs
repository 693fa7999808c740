//! Fragment mining, MCTS search tree and engine, and the code-base/reward
//! training-data harness for the ARC grid-program synthesis engine.
//!
//! `problem` gives you the shape a caller hands in. `codebase`/`harness`
//! load and save the `.bopDB` corpus and its reward training data.
//! `fragment` mines that corpus into a stack-shape-indexed prior. `mcts`
//! is the arena-indexed search tree; `engine` drives one search over it.

pub mod codebase;
pub mod config;
pub mod engine;
pub mod fragment;
pub mod harness;
pub mod mcts;
pub mod problem;

pub use codebase::{CodeBase, CodeBaseEntry};
pub use config::{SearchConfig, StoppingConfig};
pub use engine::{Engine, SearchResult, StopReason, TopSolution};
pub use fragment::FragmentInventory;
pub use harness::{HarnessError, RewardRow};
pub use mcts::{MctsTree, NodeId};
pub use problem::{Example, Problem, ProblemError, Source};
