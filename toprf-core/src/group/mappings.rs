//! Encoding of base field elements onto BabyJubJub, following [RFC9380](https://www.rfc-editor.org/rfc/rfc9380.html).
//!
//! The field element is first hashed with Poseidon2, mapped onto the birationally equivalent Montgomery curve with
//! Elligator2, moved to the twisted Edwards form with the rational map and finally multiplied by the cofactor.
use ark_ec::AffineRepr;
use ark_ff::{BigInt, BigInteger, Field, One, PrimeField, Zero};
use subtle::{Choice, ConstantTimeEq};

use crate::group::{Affine, BaseField};

const HASH_TO_FIELD_DS: &[u8] = b"TOPRF_HashToField_BabyJubJub";

/// Montgomery coefficient `J`. `K` is one for BabyJubJub, which removes a few multiplications below.
const MONTGOMERY_J: u64 = 168698;

/// Non-square `Z` for Elligator2 (RFC9380, Appendix H.3 `find_z_ell2`).
const ELLIGATOR_Z: u64 = 5;

fn hash_to_field_ds() -> BaseField {
    BaseField::from_be_bytes_mod_order(HASH_TO_FIELD_DS)
}

/// Maps a field element to a point in the prime-order subgroup, without anyone knowing its discrete log.
///
/// This is the non-uniform `encode_to_curve` of RFC9380, which hits about half of the curve points. That is enough
/// for the OPRF, which only needs the output to be unpredictable.
pub(crate) fn encode_to_curve(input: BaseField) -> Affine {
    let u = hash_to_field(input);
    let (s, t) = map_to_curve_elligator2(u);
    let (v, w) = rational_map_mont_to_twisted_edwards(s, t);
    Affine::new_unchecked(v, w).clear_cofactor()
}

fn hash_to_field(input: BaseField) -> BaseField {
    // state[0] is the capacity of the sponge
    poseidon2::bn254::t3::permutation(&[hash_to_field_ds(), input, BaseField::zero()])[1]
}

/// Elligator2 (RFC9380, Section 6.7.1) onto `t^2 = s^3 + J*s^2 + s`. Returns `(s, t)`.
fn map_to_curve_elligator2(input: BaseField) -> (BaseField, BaseField) {
    let c1 = BaseField::from(MONTGOMERY_J);
    let z = BaseField::from(ELLIGATOR_Z);
    let tv1 = z * input.square();
    let e1 = ct_is_zero(tv1 + BaseField::one());
    let tv1 = ct_select(BaseField::zero(), tv1, e1);
    let x1 = inv0(tv1 + BaseField::one());
    let x1 = -c1 * x1;
    let gx1 = (x1 + c1) * x1.square() + x1;
    let x2 = -x1 - c1;
    let gx2 = tv1 * gx1;
    let e2 = ct_is_square(gx1);
    let x = ct_select(x1, x2, e2);
    let y2 = ct_select(gx1, gx2, e2);
    // either gx1 is square or gx2 = Z * u^2 * gx1 is, since Z is a non-square
    let y = y2.sqrt().unwrap_or_else(BaseField::zero);
    let e3 = Choice::from(sgn0(y) as u8);
    let y = ct_select(-y, y, e2 ^ e3);
    (x, y)
}

/// Rational map from Montgomery `(s, t)` to twisted Edwards `(v, w)` (RFC9380, Appendix D.1), including the
/// exceptional cases.
fn rational_map_mont_to_twisted_edwards(s: BaseField, t: BaseField) -> (BaseField, BaseField) {
    let tv1 = s + BaseField::one();
    let tv2 = inv0(tv1 * t);
    let v = tv1 * tv2 * s;
    let w = tv2 * t * (s - BaseField::one());
    let e = ct_is_zero(tv2);
    let w = ct_select(BaseField::one(), w, e);
    (v, w)
}

fn ct_is_zero<F: PrimeField>(v: F) -> Choice {
    // arkworks has no subtle support, so compare the canonical byte representations instead
    let lhs = v.into_bigint().to_bytes_le();
    let rhs = vec![0u8; lhs.len()];
    lhs.ct_eq(&rhs)
}

fn ct_select<F: PrimeField>(lhs: F, rhs: F, choice: Choice) -> F {
    let choice = F::from(choice.unwrap_u8());
    rhs + (lhs - rhs) * choice
}

fn ct_is_square<F: PrimeField>(x: F) -> Choice {
    let legendre = x.pow(F::MODULUS_MINUS_ONE_DIV_TWO).into_bigint().to_bytes_le();
    let zero = vec![0u8; legendre.len()];
    let one = F::one().into_bigint().to_bytes_le();
    legendre.ct_eq(&zero) ^ legendre.ct_eq(&one)
}

trait Inv0Constants: PrimeField {
    const MODULUS_MINUS_2: Self::BigInt;
}

impl Inv0Constants for BaseField {
    const MODULUS_MINUS_2: Self::BigInt =
        BigInt!("21888242871839275222246405745257275088548364400416034343698204186575808495615");
}

/// Inverse that maps zero to zero.
fn inv0<F: Inv0Constants>(x: F) -> F {
    x.pow(F::MODULUS_MINUS_2)
}

/// `sgn0` of RFC9380, Section 4.1.
fn sgn0<F: PrimeField>(x: F) -> bool {
    x.into_bigint().is_odd()
}
