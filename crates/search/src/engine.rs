//! The search engine: owns the primitive catalogue, the mined fragment
//! inventory, and the reward model, and drives one MCTS search per problem.
//! Composition over inheritance, per the design notes (§9) — `Engine` holds
//! its collaborators rather than subclassing a base search object the way
//! the original's module-level functions implicitly closed over global
//! state. Grounded on `MCTS.py::run_search` and `CodeGen.py::new_moves`.

use crate::config::SearchConfig;
use crate::fragment::{item_digest, stack_npic, FragmentInventory};
use crate::mcts::{CodeItem, MctsTree, NodeId};
use crate::problem::Problem;
use arc_synth_core::Grid;
use arc_synth_runtime::eval::{EVAL_FULL_MATCH, IDX_PIC_REACH_MEAN, IDX_PIC_REACH_MIN};
use arc_synth_runtime::{eval_code, LENGTH_CODE_EVAL};
use arc_synth_runtime::{Multicore, PrimitiveRegistry, RewardModel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

/// Why `run_search` stopped, in the exact priority order it is checked:
/// a floor on walks taken always wins first, then too many broken walks
/// (no legal move generated), then enough full matches, then a wall-clock
/// timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Lost,
    Found,
    Time,
}

/// One surviving top-N solution: the code that produced it, its evaluation,
/// and when/how it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct TopSolution {
    pub source: Vec<String>,
    pub evaluation: [f64; LENGTH_CODE_EVAL],
    pub elapsed_sec: f64,
    pub num_walks: u32,
    pub prediction: Vec<Grid>,
}

/// The outcome of one `run_search` call: the best solutions found, ranked
/// descending, plus run totals.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub top: Vec<TopSolution>,
    pub total_elapsed_sec: f64,
    pub total_walks: u32,
    pub stopped_on: StopReason,
}

struct Move {
    code: CodeItem,
    prior: f64,
    reward: f64,
    eval: [f64; LENGTH_CODE_EVAL],
}

fn top_n_score(eval: &[f64; LENGTH_CODE_EVAL], weight_min_in_eval: f64) -> f64 {
    eval[IDX_PIC_REACH_MEAN] * (1.0 - weight_min_in_eval) + eval[IDX_PIC_REACH_MIN] * weight_min_in_eval
}

pub struct Engine {
    registry: PrimitiveRegistry,
    fragments: FragmentInventory,
    reward: RewardModel,
    config: SearchConfig,
    rng: StdRng,
}

impl Engine {
    pub fn new(registry: PrimitiveRegistry, fragments: FragmentInventory, reward: RewardModel, config: SearchConfig) -> Engine {
        let rng = StdRng::seed_from_u64(config.rng_seed);
        Engine { registry, fragments, reward, config, rng }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs one MCTS search to completion against `problem`, returning the
    /// top solutions found and why the search stopped. Grounded on
    /// `MCTS.py::run_search`'s main loop: select a leaf, expand it with
    /// `new_moves`, score each new child against the top-N list, then
    /// back-propagate a discounted reward from the leaf to the root.
    pub fn run_search(&mut self, problem: &Problem) -> SearchResult {
        let (demo, tests) = problem.multicore_inputs();
        let root_state = Multicore::clear(&demo, &tests);

        let mut tree = MctsTree::new();
        let mut top_n: Vec<(f64, TopSolution)> = Vec::new();
        let mut top_min = 0.0f64;

        let start = Instant::now();
        let mut num_walks: u32 = 0;
        let mut num_broken_walks: u32 = 0;
        let mut num_full_matches: u32 = 0;

        let stopped_on = loop {
            if let Some(reason) = self.check_stop(num_walks, num_broken_walks, num_full_matches, start.elapsed().as_secs_f64())
            {
                break reason;
            }

            num_walks += 1;
            if num_walks % self.config.add_exp_noise_each == 0 && !tree.is_leaf(tree.root()) {
                tree.add_exploration_noise(tree.root(), &self.config, &mut self.rng);
            }

            let leaf = tree.select_leaf(&self.config);
            let moves = self.new_moves(&tree, leaf, &root_state);
            let visits = moves.len() as u32;

            let mean_new_child_reward = if moves.is_empty() {
                0.0
            } else {
                moves.iter().map(|mv| mv.reward).sum::<f64>() / moves.len() as f64
            };
            if mean_new_child_reward < self.config.stopping.broken_threshold {
                num_broken_walks += 1;
            } else {
                num_broken_walks = 0;
            }

            let mut total_reward = 0.0;
            for mv in moves {
                let child = tree.add_child(leaf, mv.code.clone(), mv.prior, mv.reward);
                total_reward += mv.reward;

                let score = top_n_score(&mv.eval, self.config.weight_min_in_eval);
                if score > top_min {
                    let source = tree.code_in_path(child);
                    let prediction = predict(&root_state, &source, &self.registry);
                    let entry = TopSolution {
                        source: arc_synth_runtime::decompile(&source),
                        evaluation: mv.eval,
                        elapsed_sec: start.elapsed().as_secs_f64(),
                        num_walks,
                        prediction,
                    };
                    push_to_top_n(&mut top_n, &mut top_min, self.config.num_top_solutions, score, entry);
                }

                if mv.eval[IDX_PIC_REACH_MIN] == EVAL_FULL_MATCH {
                    num_full_matches += 1;
                }
            }

            // Backprop always runs, even on a broken (no-children) walk:
            // `MCTS.py`'s loop carries `visits = len(new_moves)` and
            // `rewards = sum(...)` into every ancestor regardless of whether
            // either is zero.
            let mut reward = total_reward;
            let mut node = leaf;
            loop {
                let n = tree.node_mut(node);
                n.reward += reward;
                n.visits += visits;
                reward *= self.config.reward_discount;
                match tree.parent(node) {
                    Some(p) => node = p,
                    None => break,
                }
            }
        };

        SearchResult {
            top: top_n.into_iter().map(|(_, s)| s).collect(),
            total_elapsed_sec: start.elapsed().as_secs_f64(),
            total_walks: num_walks,
            stopped_on,
        }
    }

    fn check_stop(&self, num_walks: u32, num_broken_walks: u32, num_full_matches: u32, elapsed_sec: f64) -> Option<StopReason> {
        let s = &self.config.stopping;
        if num_walks < s.min_num_walks {
            return None;
        }
        if num_broken_walks > s.max_broken_walks {
            return Some(StopReason::Lost);
        }
        if num_full_matches >= s.stop_num_full_matches {
            return Some(StopReason::Found);
        }
        if elapsed_sec >= s.max_elapsed_sec {
            return Some(StopReason::Time);
        }
        None
    }

    /// Generates candidate next moves for `leaf`: replays the path to
    /// `leaf` on a fresh multicore snapshot, queries the fragment inventory
    /// for items whose stack-use signature the current stack can afford,
    /// runs each candidate, and scores the survivors with the reward model.
    /// `max_moves` shrinks geometrically with depth from the root — deep
    /// nodes get fewer, more committed continuations. Grounded on
    /// `CodeGen.py::new_moves`.
    fn new_moves(&mut self, tree: &MctsTree, leaf: NodeId, root_state: &Multicore) -> Vec<Move> {
        let depth = tree.path_to_node(leaf).len() as i32;
        let max_moves = self.config.max_moves_at_root as f64 * self.config.num_moves_stp_discount.powi(depth);
        if max_moves < 1.0 {
            return Vec::new();
        }
        let max_moves = max_moves as usize;

        let code_so_far = tree.code_in_path(leaf);
        let mut mc = root_state.snapshot();
        mc.run_all(&code_so_far, &self.registry, true);
        let state_to_node = mc.snapshot();

        let lane_stack = &mc.states()[0].stack;
        let npic = stack_npic(lane_stack);
        let height = lane_stack.len() as i64;

        let prev_digest = item_digest(&code_so_far);
        let candidates = self.fragments.items_for(npic, height);

        let mut collected: Vec<(CodeItem, f64, [f64; LENGTH_CODE_EVAL])> = Vec::new();
        for (item, prior) in candidates {
            if collected.len() >= max_moves {
                break;
            }
            mc.restore(&state_to_node);
            let ret = mc.run_all(&item, &self.registry, false);
            if ret.is_error() {
                continue;
            }
            let Some(eval) = eval_code(&mc) else {
                continue;
            };

            let mut prior = prior;
            if self.fragments.in_snippet(prev_digest, item_digest(&item)) {
                prior += self.config.prior_boost_in_snippet;
            }
            collected.push((item, prior, eval));
        }

        let evals: Vec<[f64; LENGTH_CODE_EVAL]> = collected.iter().map(|(_, _, e)| *e).collect();
        let rewards = self.reward.predict(&evals);

        collected
            .into_iter()
            .zip(rewards)
            .map(|((code, prior, eval), reward)| Move { code, prior, reward, eval })
            .collect()
    }
}

fn push_to_top_n(top_n: &mut Vec<(f64, TopSolution)>, top_min: &mut f64, capacity: usize, score: f64, entry: TopSolution) {
    if score <= *top_min {
        return;
    }
    if top_n.len() >= capacity {
        top_n.pop();
    }
    top_n.push((score, entry));
    top_n.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
    if top_n.len() >= capacity {
        *top_min = top_n.last().unwrap().0;
    }
}

/// Replays `source` against `root_state`'s test lanes and reads off each
/// one's produced picture, for reporting a top solution's prediction.
fn predict(root_state: &Multicore, source: &[arc_synth_runtime::Value], registry: &PrimitiveRegistry) -> Vec<Grid> {
    let mut mc = root_state.snapshot();
    mc.run_all(source, registry, true);
    mc.pic_lists()
        .iter()
        .skip(mc.num_demo())
        .filter_map(|pics| pics.last().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebase::CodeBase;
    use crate::problem::{Example, Problem, Source};
    use arc_synth_runtime::{compile, default_registry};

    fn g(rows: Vec<Vec<i32>>) -> Grid {
        Grid::from_rows(rows).unwrap()
    }

    fn build_engine(weight_prior_by_form: f64) -> Engine {
        let registry = default_registry();
        let mut cb = CodeBase::new();
        let program = compile(&["get_question".to_string(), "pic_rotate_90ccw".to_string()], &registry).unwrap();
        cb.add(
            "rot".to_string(),
            Source::new(vec!["get_question".to_string(), "pic_rotate_90ccw".to_string()]),
            program,
            g(vec![vec![1, 2], vec![3, 4]]),
        )
        .unwrap();
        let fragments = FragmentInventory::build(&cb, &registry, weight_prior_by_form);
        Engine::new(registry, fragments, RewardModel::Heuristic, SearchConfig::default())
    }

    #[test]
    fn stop_reason_prioritizes_the_walk_floor_over_everything_else() {
        let engine = build_engine(0.3);
        assert_eq!(engine.check_stop(0, 999, 999, 999.0), None);
    }

    #[test]
    fn stop_reason_prefers_lost_over_found_over_time() {
        let mut cfg = SearchConfig::default();
        cfg.stopping.min_num_walks = 0;
        let mut engine = build_engine(0.3);
        engine.config = cfg;
        assert_eq!(engine.check_stop(10, 100, 100, 100.0), Some(StopReason::Lost));
    }

    #[test]
    fn run_search_on_a_rotation_task_finds_a_full_match_quickly() {
        let mut engine = build_engine(0.3);
        engine.config.stopping.min_num_walks = 1;
        engine.config.stopping.max_elapsed_sec = 5.0;

        let train = vec![
            Example::demo(g(vec![vec![1, 2], vec![3, 4]]), g(vec![vec![2, 4], vec![1, 3]])),
            Example::demo(g(vec![vec![5, 6]]), g(vec![vec![6], vec![5]])),
        ];
        let test = vec![Example::test(g(vec![vec![7, 8], vec![9, 1]]))];
        let problem = Problem::new(train, test).unwrap();

        let result = engine.run_search(&problem);
        assert!(result.total_walks >= 1);
    }

    #[test]
    fn broken_walk_count_resets_on_a_productive_walk() {
        // An impossibly high broken_threshold makes every walk's mean new-child
        // reward count as broken; max_broken_walks=1 tolerates one consecutive
        // broken walk (`num_broken_walks > max_broken_walks`) and only stops
        // once the count exceeds it, on the second walk.
        let mut engine = build_engine(0.3);
        engine.config.stopping.min_num_walks = 0;
        engine.config.stopping.broken_threshold = 10.0;
        engine.config.stopping.max_broken_walks = 1;
        engine.config.stopping.max_elapsed_sec = 5.0;

        let train = vec![
            Example::demo(g(vec![vec![1, 2], vec![3, 4]]), g(vec![vec![2, 4], vec![1, 3]])),
            Example::demo(g(vec![vec![5, 6]]), g(vec![vec![6], vec![5]])),
        ];
        let test = vec![Example::test(g(vec![vec![7, 8], vec![9, 1]]))];
        let problem = Problem::new(train, test).unwrap();

        let result = engine.run_search(&problem);
        assert_eq!(result.stopped_on, StopReason::Lost);
        assert_eq!(result.total_walks, 2);
    }
}
