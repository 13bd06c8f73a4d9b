//! Oblivious maximum selection.
//!
//! Comparisons produce secret indicators which are blended back into values and
//! indices arithmetically, so no comparison outcome is ever revealed.

use itertools::Itertools;
use shroud_shared_types::Numeric;
use tracing::trace;

use crate::linalg::LinAlgError;

/// A secret value together with the secret index it came from.
pub struct Candidate<N: Numeric> {
    /// The value being compared
    pub value: N::SFixed,
    /// Where the value sits in the original vector
    pub index: N::SInt,
}

impl<N: Numeric> Clone for Candidate<N> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            index: self.index.clone(),
        }
    }
}

/// The larger of two candidates. On a tie `y` wins.
///
/// With `ind = 1[x <= y]` the result is `x + ind·(y − x)` and the index
/// `ind·y_idx + (1 − ind)·x_idx`.
pub fn max_pair<N: Numeric>(numeric: &mut N, x: &Candidate<N>, y: &Candidate<N>) -> Candidate<N> {
    numeric.seq(|seq| {
        let ind = seq.leq(&x.value, &y.value);
        seq.par(|par| {
            let value = par.seq(|seq| {
                let ind = seq.from_sint(&ind);
                let gap = seq.sub(&y.value, &x.value);
                let step = seq.mult(&ind, &gap);
                seq.add(&x.value, &step)
            });
            let index = par.seq(|seq| {
                let gap = seq.sub_int(&y.index, &x.index);
                let step = seq.mult_int(&ind, &gap);
                seq.add_int(&x.index, &step)
            });
            Candidate { value, index }
        })
    })
}

/// Maximum of a non-empty vector with its secret index, by a pairwise tournament.
///
/// Each level compares disjoint pairs in parallel, so the depth is `ceil(log2 n)`
/// comparisons. An odd candidate out moves up a level untouched. Ties resolve to the
/// higher index.
pub fn max_with_index<N: Numeric>(
    numeric: &mut N,
    values: &[N::SFixed],
) -> Result<Candidate<N>, LinAlgError> {
    if values.is_empty() {
        return Err(LinAlgError::EmptyInput);
    }
    let mut level = values
        .iter()
        .enumerate()
        .map(|(i, value)| Candidate {
            value: value.clone(),
            index: numeric.known_int(i as i64),
        })
        .collect_vec();

    numeric.seq(|seq| {
        while level.len() > 1 {
            trace!(module = "compare", candidates = level.len(), "Tournament level");
            level = seq.par(|par| {
                level
                    .chunks(2)
                    .map(|pair| match pair {
                        [x, y] => max_pair(par, x, y),
                        _ => pair[0].clone(),
                    })
                    .collect_vec()
            });
        }
    });

    level.pop().ok_or(LinAlgError::EmptyInput)
}

/// Secret index of the maximum coordinate.
pub fn arg_max<N: Numeric>(numeric: &mut N, values: &[N::SFixed]) -> Result<N::SInt, LinAlgError> {
    max_with_index(numeric, values).map(|winner| winner.index)
}

#[cfg(test)]
mod tests {
    use ark_std::test_rng;
    use rand::Rng;
    use shroud_shared_types::DummyNumeric;

    use super::*;

    fn secret_vec(numeric: &mut DummyNumeric, values: &[f64]) -> Vec<<DummyNumeric as Numeric>::SFixed> {
        values.iter().map(|v| numeric.known(*v)).collect_vec()
    }

    #[test]
    fn test_arg_max_small() {
        let mut numeric = DummyNumeric::default();
        let values = secret_vec(&mut numeric, &[0.3, -1.0, 2.5, 0.0, 1.7]);
        let winner = max_with_index(&mut numeric, &values).unwrap();
        assert_eq!(numeric.open_int(&winner.index).unwrap(), 2);
        assert!((numeric.open(&winner.value).unwrap() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_ties_go_to_higher_index() {
        let mut numeric = DummyNumeric::default();
        let values = secret_vec(&mut numeric, &[1.0, 4.0, 2.0, 4.0, 4.0, 0.0]);
        let index = arg_max(&mut numeric, &values).unwrap();
        assert_eq!(numeric.open_int(&index).unwrap(), 4);
    }

    #[test]
    fn test_arg_max_random() {
        let mut rng = test_rng();
        for len in 1..=17 {
            let mut numeric = DummyNumeric::default();
            let plain = (0..len).map(|_| rng.gen_range(-10.0..10.0)).collect_vec();
            let expected = plain
                .iter()
                .enumerate()
                .fold(0, |best, (i, v)| if *v >= plain[best] { i } else { best });
            let values = secret_vec(&mut numeric, &plain);
            let index = arg_max(&mut numeric, &values).unwrap();
            assert_eq!(numeric.open_int(&index).unwrap(), expected as i64);
        }
    }

    #[test]
    fn test_tournament_depth_and_privacy() {
        let mut numeric = DummyNumeric::default();
        let values = secret_vec(&mut numeric, &[5.0, 1.0, 3.0, 8.0, 2.0, 7.0, 6.0, 4.0]);
        arg_max(&mut numeric, &values).unwrap();

        // --- Three levels, each a comparison followed by a blend ---
        assert_eq!(numeric.rounds(), 6);
        assert_eq!(numeric.stats().comparisons, 7);
        assert_eq!(numeric.stats().openings, 0);
    }

    #[test]
    fn test_empty_rejected() {
        let mut numeric = DummyNumeric::default();
        assert_eq!(
            arg_max::<DummyNumeric>(&mut numeric, &[]).unwrap_err(),
            LinAlgError::EmptyInput
        );
    }
}
