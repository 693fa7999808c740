//! The data model a caller hands the search engine: one ARC task as a set
//! of worked demo examples plus held-out test questions. Grounded on
//! `Problem.py`/`Example.py`/`Source.py` — their JSON directory loader
//! (`Context.py`) is out of scope here; callers construct these values
//! programmatically (from whatever storage they use) and hand them straight
//! to `Engine::run_search`.

use arc_synth_core::Grid;
use std::fmt;

/// One demo or test case: an input grid, and — for demo cases only — the
/// known output. Test cases carry `output: None`; the engine never sees a
/// test's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub input: Grid,
    pub output: Option<Grid>,
}

impl Example {
    pub fn demo(input: Grid, output: Grid) -> Self {
        Example { input, output: Some(output) }
    }

    pub fn test(input: Grid) -> Self {
        Example { input, output: None }
    }
}

/// Failure validating a `Problem`'s shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemError {
    TooFewDemos(usize),
    TooManyDemos(usize),
    NoTests,
    TooManyTests(usize),
    DemoMissingOutput(usize),
}

impl fmt::Display for ProblemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemError::TooFewDemos(n) => write!(f, "a problem needs at least 2 demo examples, got {n}"),
            ProblemError::TooManyDemos(n) => write!(f, "a problem allows at most 10 demo examples, got {n}"),
            ProblemError::NoTests => write!(f, "a problem needs at least 1 test question"),
            ProblemError::TooManyTests(n) => write!(f, "a problem allows at most 3 test questions, got {n}"),
            ProblemError::DemoMissingOutput(i) => write!(f, "demo example {i} has no known output"),
        }
    }
}

impl std::error::Error for ProblemError {}

/// One ARC task: worked demo pairs the engine searches against, plus one to
/// three held-out test questions it predicts answers for.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    train: Vec<Example>,
    test: Vec<Example>,
}

impl Problem {
    /// Validates the shape the original's `Problem` class enforces: 2..=10
    /// demo examples (all with a known output), 1..=3 test questions.
    pub fn new(train: Vec<Example>, test: Vec<Example>) -> Result<Self, ProblemError> {
        if train.len() < 2 {
            return Err(ProblemError::TooFewDemos(train.len()));
        }
        if train.len() > 10 {
            return Err(ProblemError::TooManyDemos(train.len()));
        }
        if test.is_empty() {
            return Err(ProblemError::NoTests);
        }
        if test.len() > 3 {
            return Err(ProblemError::TooManyTests(test.len()));
        }
        for (i, ex) in train.iter().enumerate() {
            if ex.output.is_none() {
                return Err(ProblemError::DemoMissingOutput(i));
            }
        }
        Ok(Problem { train, test })
    }

    pub fn train(&self) -> &[Example] {
        &self.train
    }

    pub fn test(&self) -> &[Example] {
        &self.test
    }

    /// The `(demo, tests)` shape `Multicore::clear` wants: demo pairs as
    /// `(question, answer)` grids, test questions as bare input grids.
    pub fn multicore_inputs(&self) -> (Vec<(Grid, Grid)>, Vec<Grid>) {
        let demo = self
            .train
            .iter()
            .map(|ex| (ex.input.clone(), ex.output.clone().expect("validated at construction")))
            .collect();
        let tests = self.test.iter().map(|ex| ex.input.clone()).collect();
        (demo, tests)
    }
}

/// A named code snippet as it sits in a code base: the textual source lines
/// `compile` accepts, plus a sample picture shown alongside it for human
/// browsing (`CodeBase.py`'s per-entry sample, unrelated to the problem
/// it was mined from).
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub lines: Vec<String>,
}

impl Source {
    pub fn new(lines: Vec<String>) -> Self {
        Source { lines }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g() -> Grid {
        Grid::from_rows(vec![vec![1, 2]]).unwrap()
    }

    #[test]
    fn rejects_a_single_demo_example() {
        let err = Problem::new(vec![Example::demo(g(), g())], vec![Example::test(g())]).unwrap_err();
        assert_eq!(err, ProblemError::TooFewDemos(1));
    }

    #[test]
    fn rejects_no_test_questions() {
        let train = vec![Example::demo(g(), g()), Example::demo(g(), g())];
        let err = Problem::new(train, vec![]).unwrap_err();
        assert_eq!(err, ProblemError::NoTests);
    }

    #[test]
    fn rejects_a_demo_example_with_no_output() {
        let train = vec![Example::demo(g(), g()), Example::test(g())];
        let err = Problem::new(train, vec![Example::test(g())]).unwrap_err();
        assert_eq!(err, ProblemError::DemoMissingOutput(1));
    }

    #[test]
    fn accepts_a_well_shaped_problem_and_derives_multicore_inputs() {
        let train = vec![Example::demo(g(), g()), Example::demo(g(), g())];
        let test = vec![Example::test(g())];
        let problem = Problem::new(train, test).unwrap();
        let (demo, tests) = problem.multicore_inputs();
        assert_eq!(demo.len(), 2);
        assert_eq!(tests.len(), 1);
    }
}
