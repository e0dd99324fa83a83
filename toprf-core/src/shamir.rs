//! Utilities for Lagrange interpolation and polynomial evaluation over the scalar field.
//
//! Provides functions to compute Lagrange coefficients at `x = 0`, evaluate sharing polynomials, reconstruct secrets
//! from shares and recombine partial evaluations in the exponent.

use std::collections::HashSet;

use ark_ec::{CurveGroup, VariableBaseMSM};
use ark_ff::{Field, One, Zero};

use crate::{
    Error,
    group::{Affine, Projective, ScalarField},
    keygen::ShareIndex,
};

/// Computes the Lagrange coefficients at `x = 0` for all provided party indices.
///
/// # Errors
/// Returns [`Error::EmptyIndexSet`] or [`Error::DuplicateIndex`] for malformed index sets.
pub fn lagrange_from_coeff(indices: &[ShareIndex]) -> Result<Vec<ScalarField>, Error> {
    check_index_set(indices)?;
    Ok(indices
        .iter()
        .map(|&i| lagrange_unchecked(i, indices))
        .collect())
}

/// Computes the Lagrange coefficient at `x = 0` for `my_id` within the index set `indices`:
/// `prod_{j != my_id} j / (j - my_id)`.
///
/// # Errors
/// Returns [`Error::EmptyIndexSet`] or [`Error::DuplicateIndex`] for malformed index sets and
/// [`Error::UnknownParty`] if `my_id` is not part of `indices`.
pub fn single_lagrange_from_coeff(
    my_id: ShareIndex,
    indices: &[ShareIndex],
) -> Result<ScalarField, Error> {
    check_index_set(indices)?;
    if !indices.contains(&my_id) {
        return Err(Error::UnknownParty(my_id.get()));
    }
    Ok(lagrange_unchecked(my_id, indices))
}

// Callers guarantee that `indices` are distinct, so the denominator is a product of non-zero differences.
fn lagrange_unchecked(my_id: ShareIndex, indices: &[ShareIndex]) -> ScalarField {
    let mut num = ScalarField::one();
    let mut den = ScalarField::one();
    let i_ = ScalarField::from(my_id);
    for &j in indices.iter().filter(|&&j| j != my_id) {
        let j_ = ScalarField::from(j);
        num *= j_;
        den *= j_ - i_;
    }
    // distinct indices below N never produce a zero difference
    num * den.inverse().unwrap_or_else(ScalarField::zero)
}

fn check_index_set(indices: &[ShareIndex]) -> Result<(), Error> {
    if indices.is_empty() {
        return Err(Error::EmptyIndexSet);
    }
    let mut seen = HashSet::with_capacity(indices.len());
    for i in indices {
        if !seen.insert(i) {
            return Err(Error::DuplicateIndex(i.get()));
        }
    }
    Ok(())
}

/// Evaluates `secret + coeffs[0]*x + coeffs[1]*x^2 + ...` with Horner's method.
pub(crate) fn evaluate_poly(
    secret: ScalarField,
    coeffs: &[ScalarField],
    x: ScalarField,
) -> ScalarField {
    coeffs
        .iter()
        .rev()
        .fold(ScalarField::zero(), |acc, coeff| (acc + coeff) * x)
        + secret
}

/// Recovers the secret by combining shares with Lagrange coefficients.
pub fn reconstruct(shares: &[ScalarField], lagrange: &[ScalarField]) -> ScalarField {
    debug_assert_eq!(shares.len(), lagrange.len());
    shares
        .iter()
        .zip(lagrange.iter())
        .map(|(s, l)| *s * l)
        .sum()
}

/// Recombines partial evaluations `x_i * P` of the parties `indices` into `x * P`, where `x` is the shared secret.
///
/// Each evaluation is scaled by the Lagrange coefficient of its index and the results are summed. The output is the
/// same for every quorum of at least `threshold` distinct parties holding shares of the same polynomial.
///
/// # Errors
/// Returns [`Error::LengthMismatch`] if indices and evaluations do not pair up, [`Error::NotEnoughContributions`] for
/// fewer than `threshold` contributions, and [`Error::EmptyIndexSet`]/[`Error::DuplicateIndex`] for malformed index
/// sets. All checks run before any group operation.
pub fn combine_threshold(
    indices: &[ShareIndex],
    evaluations: &[Affine],
    threshold: usize,
) -> Result<Affine, Error> {
    if indices.len() != evaluations.len() {
        return Err(Error::LengthMismatch {
            indices: indices.len(),
            evaluations: evaluations.len(),
        });
    }
    if indices.is_empty() {
        return Err(Error::EmptyIndexSet);
    }
    if indices.len() < threshold {
        return Err(Error::NotEnoughContributions {
            got: indices.len(),
            threshold,
        });
    }
    let lagrange = lagrange_from_coeff(indices)?;
    Ok(Projective::msm_unchecked(evaluations, &lagrange).into_affine())
}

#[cfg(test)]
mod tests {
    use ark_ff::UniformRand;

    use super::*;
    use crate::group::CURVE;

    fn indices(ids: &[u16]) -> Vec<ShareIndex> {
        ids.iter().map(|&i| ShareIndex::new(i).unwrap()).collect()
    }

    #[test]
    fn test_evaluate_poly() {
        // f(x) = 7 + 2x + 3x^2
        let coeffs = [ScalarField::from(2u64), ScalarField::from(3u64)];
        let secret = ScalarField::from(7u64);
        assert_eq!(evaluate_poly(secret, &coeffs, ScalarField::from(0u64)), secret);
        assert_eq!(
            evaluate_poly(secret, &coeffs, ScalarField::from(1u64)),
            ScalarField::from(12u64)
        );
        assert_eq!(
            evaluate_poly(secret, &coeffs, ScalarField::from(5u64)),
            ScalarField::from(7 + 10 + 75u64)
        );
        assert_eq!(evaluate_poly(secret, &[], ScalarField::from(5u64)), secret);
    }

    #[test]
    fn test_lagrange_coefficients() {
        // for {1, 2}: l_1 = 2 / (2 - 1) = 2, l_2 = 1 / (1 - 2) = -1
        let ids = indices(&[1, 2]);
        let lagrange = lagrange_from_coeff(&ids).unwrap();
        assert_eq!(lagrange, vec![ScalarField::from(2u64), -ScalarField::from(1u64)]);
        assert_eq!(single_lagrange_from_coeff(ids[1], &ids).unwrap(), lagrange[1]);

        // coefficients interpolate the constant polynomial
        let ids = indices(&[3, 7, 11, 12]);
        let sum: ScalarField = lagrange_from_coeff(&ids).unwrap().into_iter().sum();
        assert_eq!(sum, ScalarField::one());

        // order of the index set does not matter
        let shuffled = indices(&[12, 3, 11, 7]);
        assert_eq!(
            single_lagrange_from_coeff(ids[0], &ids).unwrap(),
            single_lagrange_from_coeff(ids[0], &shuffled).unwrap()
        );
    }

    #[test]
    fn test_lagrange_invalid_index_sets() {
        assert_eq!(lagrange_from_coeff(&[]), Err(Error::EmptyIndexSet));
        assert_eq!(
            lagrange_from_coeff(&indices(&[1, 2, 1])),
            Err(Error::DuplicateIndex(1))
        );
        assert_eq!(
            single_lagrange_from_coeff(ShareIndex::new(4).unwrap(), &indices(&[1, 2])),
            Err(Error::UnknownParty(4))
        );
    }

    #[test]
    fn test_combine_threshold() {
        let mut rng = rand::thread_rng();
        let secret = ScalarField::rand(&mut rng);
        let coeffs = [ScalarField::rand(&mut rng), ScalarField::rand(&mut rng)];
        let point = crate::group::hash_to_point(b"combine");
        let evals = (1..=5u16)
            .map(|i| (point * evaluate_poly(secret, &coeffs, ScalarField::from(i))).into_affine())
            .collect::<Vec<_>>();
        let expected = (point * secret).into_affine();
        for ids in [[1u16, 3, 5], [2, 4, 5], [5, 1, 2]] {
            let quorum = indices(&ids);
            let partial = ids
                .iter()
                .map(|&i| evals[usize::from(i) - 1])
                .collect::<Vec<_>>();
            assert_eq!(combine_threshold(&quorum, &partial, 3).unwrap(), expected);
        }
        let all = indices(&[1, 2, 3, 4, 5]);
        assert_eq!(combine_threshold(&all, &evals, 3).unwrap(), expected);
    }

    #[test]
    fn test_combine_threshold_preconditions() {
        let g = CURVE.generator();
        assert_eq!(
            combine_threshold(&indices(&[1, 2]), &[g, g], 3),
            Err(Error::NotEnoughContributions {
                got: 2,
                threshold: 3
            })
        );
        assert_eq!(
            combine_threshold(&indices(&[1, 2]), &[g], 1),
            Err(Error::LengthMismatch {
                indices: 2,
                evaluations: 1
            })
        );
        assert_eq!(combine_threshold(&[], &[], 0), Err(Error::EmptyIndexSet));
        assert_eq!(
            combine_threshold(&indices(&[2, 2]), &[g, g], 2),
            Err(Error::DuplicateIndex(2))
        );
    }

    #[test]
    fn test_reconstruct() {
        let mut rng = rand::thread_rng();
        let secret = ScalarField::rand(&mut rng);
        let coeffs = [ScalarField::rand(&mut rng)];
        let ids = indices(&[4, 9]);
        let shares = ids
            .iter()
            .map(|&i| evaluate_poly(secret, &coeffs, i.into()))
            .collect::<Vec<_>>();
        let lagrange = lagrange_from_coeff(&ids).unwrap();
        assert_eq!(reconstruct(&shares, &lagrange), secret);
    }
}
