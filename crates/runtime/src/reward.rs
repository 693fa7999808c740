//! Turns an evaluation vector into a scalar reward that guides search
//! (separate from the terminal win/loss signal). Grounded on
//! `CodeGen.py::predict_rewards`'s `DUMMY_REWARD_INSTEAD` branch for the
//! heuristic, and on its `XGBClassifier`-backed branch for the trait shape
//! (no gradient-boosting implementation ships here, only the seam).

use crate::eval::{IDX_PIC_BETTER_MEAN, IDX_PIC_REACH_MEAN, IDX_PIC_REACH_MIN, IDX_PIC_WORSE_MEAN, LENGTH_CODE_EVAL};

const WEIGHT_MIN_IN_EVAL: f64 = 0.6;

/// A trainable reward predictor over 18-float evaluation vectors. No
/// concrete implementation ships; callers plug in whatever model they
/// train offline against `search::harness`'s training-data export.
pub trait RewardClassifier {
    fn train(&mut self, features: &[[f64; LENGTH_CODE_EVAL]], labels: &[u8]);
    fn predict(&self, features: &[[f64; LENGTH_CODE_EVAL]]) -> Vec<f64>;
}

pub enum RewardModel {
    Heuristic,
    Classifier(Box<dyn RewardClassifier>),
}

impl RewardModel {
    /// Scores one evaluation vector. The heuristic only rewards moves that
    /// improved more cells than they broke on average (`better_mean >
    /// worse_mean`); among those it blends the mean and the worst-example
    /// reach, weighted so one bad training example can't be masked by the
    /// rest (`WEIGHT_MIN_IN_EVAL` favors the min).
    pub fn predict_one(&self, eval: &[f64; LENGTH_CODE_EVAL]) -> f64 {
        self.predict(std::slice::from_ref(eval))[0]
    }

    pub fn predict(&self, evals: &[[f64; LENGTH_CODE_EVAL]]) -> Vec<f64> {
        match self {
            RewardModel::Heuristic => evals.iter().map(|e| heuristic_reward(e)).collect(),
            RewardModel::Classifier(clf) => clf.predict(evals),
        }
    }
}

fn heuristic_reward(eval: &[f64; LENGTH_CODE_EVAL]) -> f64 {
    if eval[IDX_PIC_BETTER_MEAN] > eval[IDX_PIC_WORSE_MEAN] {
        eval[IDX_PIC_REACH_MEAN] * (1.0 - WEIGHT_MIN_IN_EVAL) + eval[IDX_PIC_REACH_MIN] * WEIGHT_MIN_IN_EVAL
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_with(reach_mean: f64, reach_min: f64, better_mean: f64, worse_mean: f64) -> [f64; LENGTH_CODE_EVAL] {
        let mut e = [0.0; LENGTH_CODE_EVAL];
        e[IDX_PIC_REACH_MEAN] = reach_mean;
        e[IDX_PIC_REACH_MIN] = reach_min;
        e[IDX_PIC_BETTER_MEAN] = better_mean;
        e[IDX_PIC_WORSE_MEAN] = worse_mean;
        e
    }

    #[test]
    fn heuristic_is_zero_when_worse_outweighs_better() {
        let model = RewardModel::Heuristic;
        let eval = eval_with(0.9, 0.8, 0.1, 0.5);
        assert_eq!(model.predict_one(&eval), 0.0);
    }

    #[test]
    fn heuristic_blends_mean_and_min_when_improving() {
        let model = RewardModel::Heuristic;
        let eval = eval_with(1.0, 0.5, 0.5, 0.1);
        let got = model.predict_one(&eval);
        assert!((got - (1.0 * 0.4 + 0.5 * 0.6)).abs() < 1e-9);
    }

    struct AlwaysOne;
    impl RewardClassifier for AlwaysOne {
        fn train(&mut self, _features: &[[f64; LENGTH_CODE_EVAL]], _labels: &[u8]) {}
        fn predict(&self, features: &[[f64; LENGTH_CODE_EVAL]]) -> Vec<f64> {
            vec![1.0; features.len()]
        }
    }

    #[test]
    fn classifier_variant_delegates_to_the_trait_object() {
        let model = RewardModel::Classifier(Box::new(AlwaysOne));
        let eval = eval_with(0.0, 0.0, 0.0, 0.0);
        assert_eq!(model.predict_one(&eval), 1.0);
    }
}
