//! End-to-end scenario: a problem solvable by a single corpus fragment,
//! searched with `stop_num_full_matches=1` and generous time, should stop
//! as soon as that fragment is tried rather than exhausting the walk
//! budget, and should report the match in its top-N list.

use arc_synth_core::Grid;
use arc_synth_runtime::eval::{EVAL_FULL_MATCH, IDX_PIC_REACH_MIN};
use arc_synth_runtime::{compile, default_registry, RewardModel};
use arc_synth_search::{CodeBase, Engine, Example, FragmentInventory, Problem, SearchConfig, Source, StopReason};

fn g(rows: Vec<Vec<i32>>) -> Grid {
    Grid::from_rows(rows).unwrap()
}

#[test]
fn stops_as_soon_as_the_corpus_fragment_solves_the_problem() {
    let registry = default_registry();
    let mut codebase = CodeBase::new();
    let lines = vec!["get_question".to_string(), "pic_rotate_90ccw".to_string()];
    let program = compile(&lines, &registry).unwrap();
    codebase.add("rotccw".to_string(), Source::new(lines), program, g(vec![vec![1, 2], vec![3, 4]])).unwrap();

    let fragments = FragmentInventory::build(&codebase, &registry, 0.3);
    let mut config = SearchConfig::default();
    config.stopping.min_num_walks = 1;
    config.stopping.stop_num_full_matches = 1;
    config.stopping.max_elapsed_sec = 5.0;
    let mut engine = Engine::new(registry, fragments, RewardModel::Heuristic, config);

    let train = vec![
        Example::demo(g(vec![vec![1, 2], vec![3, 4]]), g(vec![vec![2, 4], vec![1, 3]])),
        Example::demo(g(vec![vec![5, 6]]), g(vec![vec![6], vec![5]])),
    ];
    let test = vec![Example::test(g(vec![vec![7, 8], vec![9, 1]]))];
    let problem = Problem::new(train, test).unwrap();

    let result = engine.run_search(&problem);

    assert_eq!(result.stopped_on, StopReason::Found);
    assert!(result.total_walks <= engine.config().stopping.min_num_walks);
    assert!(result.top.iter().any(|sol| sol.evaluation[IDX_PIC_REACH_MIN] == EVAL_FULL_MATCH));
}
