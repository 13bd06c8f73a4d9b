use itertools::Itertools;
use rand::{rngs::StdRng, Rng, SeedableRng};
use shroud_shared_types::{DummyNumeric, Numeric};

use super::*;

type Fixed = <DummyNumeric as Numeric>::SFixed;

fn secret_vec(numeric: &mut DummyNumeric, values: &[f64]) -> Vec<Fixed> {
    values.iter().map(|v| numeric.known(*v)).collect_vec()
}

fn secret_matrix(numeric: &mut DummyNumeric, rows: &[&[f64]]) -> Matrix<Fixed> {
    Matrix::from_rows(rows.iter().map(|row| secret_vec(numeric, row)).collect_vec()).unwrap()
}

fn open_vec(numeric: &mut DummyNumeric, values: &[Fixed]) -> Vec<f64> {
    values.iter().map(|v| numeric.open(v).unwrap()).collect_vec()
}

fn assert_all_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-5, "Expected {:?}, got {:?}", expected, actual);
    }
}

#[test]
fn test_inner_product() {
    let mut numeric = DummyNumeric::default();
    let a = secret_vec(&mut numeric, &[1.0, 2.0, -3.0]);
    let b = secret_vec(&mut numeric, &[0.5, 0.25, 1.0]);
    let product = inner_product(&mut numeric, &a, &b).unwrap();
    assert_all_close(&[numeric.open(&product).unwrap()], &[-2.0]);
}

#[test]
fn test_inner_product_rejects_mismatch_before_computing() {
    let mut numeric = DummyNumeric::default();
    let a = secret_vec(&mut numeric, &[1.0, 2.0]);
    let b = secret_vec(&mut numeric, &[1.0]);
    let result = inner_product(&mut numeric, &a, &b);
    assert_eq!(
        result.unwrap_err(),
        LinAlgError::DimensionMismatch {
            expected: 2,
            actual: 1
        }
    );
    assert_eq!(numeric.stats().multiplications, 0);
}

#[test]
fn test_affine_map_and_transposed_action() {
    let mut numeric = DummyNumeric::default();
    let m = secret_matrix(&mut numeric, &[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
    let x = secret_vec(&mut numeric, &[1.0, 0.0, -1.0]);
    let b = secret_vec(&mut numeric, &[0.5, -0.5]);
    let y = secret_vec(&mut numeric, &[1.0, 2.0]);

    let mx = vector_mult(&mut numeric, &m, &x).unwrap();
    let affine = affine_map(&mut numeric, &m, &x, &b).unwrap();
    let transposed = transposed_action(&mut numeric, &m, &y).unwrap();

    assert_all_close(&open_vec(&mut numeric, &mx), &[-2.0, -2.0]);
    assert_all_close(&open_vec(&mut numeric, &affine), &[-1.5, -2.5]);
    assert_all_close(&open_vec(&mut numeric, &transposed), &[9.0, 12.0, 15.0]);

    assert!(transposed_action(&mut numeric, &m, &x).is_err());
    assert!(affine_map(&mut numeric, &m, &x, &y[..1]).is_err());
}

#[test]
fn test_transposed_action_matches_plain_transpose() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut numeric = DummyNumeric::default();
    let plain = (0..4)
        .map(|_| (0..3).map(|_| rng.gen_range(-2.0..2.0)).collect_vec())
        .collect_vec();
    let y_plain = (0..4).map(|_| rng.gen_range(-2.0..2.0)).collect_vec();

    let m = Matrix::from_rows(
        plain
            .iter()
            .map(|row| secret_vec(&mut numeric, row))
            .collect_vec(),
    )
    .unwrap();
    let y = secret_vec(&mut numeric, &y_plain);
    let actual = transposed_action(&mut numeric, &m, &y).unwrap();

    let expected = (0..3)
        .map(|j| (0..4).map(|i| plain[i][j] * y_plain[i]).sum::<f64>())
        .collect_vec();
    assert_all_close(&open_vec(&mut numeric, &actual), &expected);
}

#[test]
fn test_outer_product() {
    let mut numeric = DummyNumeric::default();
    let a = secret_vec(&mut numeric, &[1.0, -2.0]);
    let b = secret_vec(&mut numeric, &[3.0, 0.5, 2.0]);
    let m = outer_product(&mut numeric, &a, &b).unwrap();
    assert_eq!((m.rows(), m.cols()), (2, 3));
    assert_all_close(
        &open_vec(&mut numeric, m.entries()),
        &[3.0, 0.5, 2.0, -6.0, -1.0, -4.0],
    );
    assert_eq!(
        outer_product(&mut numeric, &a, &[]).unwrap_err(),
        LinAlgError::EmptyInput
    );
}

#[test]
fn test_entrywise_maps() {
    let mut numeric = DummyNumeric::default();
    let a = secret_vec(&mut numeric, &[1.0, 2.0, 3.0]);
    let b = secret_vec(&mut numeric, &[3.0, 2.0, 1.0]);

    let squared = entrywise_unary(&mut numeric, &a, |seq, x| seq.mult(x, x));
    let diff = entrywise_binary(&mut numeric, &a, &b, |seq, x, y| seq.sub(x, y)).unwrap();
    let stepped = scaled_step(&mut numeric, &a, 0.5, &b).unwrap();
    let summed = vector_sum(&mut numeric, &[a.clone(), b.clone(), a.clone()]).unwrap();

    assert_all_close(&open_vec(&mut numeric, &squared), &[1.0, 4.0, 9.0]);
    assert_all_close(&open_vec(&mut numeric, &diff), &[-2.0, 0.0, 2.0]);
    assert_all_close(&open_vec(&mut numeric, &stepped), &[2.5, 3.0, 3.5]);
    assert_all_close(&open_vec(&mut numeric, &summed), &[5.0, 6.0, 7.0]);

    assert!(vector_sum(&mut numeric, &[a.clone(), b[..2].to_vec()]).is_err());
    assert_eq!(
        vector_sum::<DummyNumeric>(&mut numeric, &[]).unwrap_err(),
        LinAlgError::EmptyInput
    );
}

#[test]
fn test_rows_are_batched_in_parallel() {
    let mut numeric = DummyNumeric::default();
    let m = secret_matrix(
        &mut numeric,
        &[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0], &[7.0, 8.0]],
    );
    let x = secret_vec(&mut numeric, &[1.0, 1.0]);
    let b = secret_vec(&mut numeric, &[0.0; 4]);

    affine_map(&mut numeric, &m, &x, &b).unwrap();
    assert_eq!(numeric.rounds(), 1);
    assert_eq!(numeric.stats().multiplications, 8);

    let squares = entrywise_unary(&mut numeric, &x, |seq, v| {
        let sq = seq.mult(v, v);
        seq.mult(&sq, v)
    });
    assert_eq!(squares.len(), 2);
    assert_eq!(numeric.rounds(), 3);
}
