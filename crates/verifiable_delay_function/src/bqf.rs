// SPDX-FileCopyrightText: 2024 Nomadic Labs <contact@nomadic-labs.com>
//
// SPDX-License-Identifier: MIT

use std::cmp::Ordering::{Equal, Greater};
use std::fmt::Debug;

use serde::Serialize;

use crate::z::{self};
use crate::VdfError;

/// Flag bit marking a negative `b` coefficient in the serialized form.
const FLAG_B_NEGATIVE: u8 = 1;

/// Byte width of one serialized coefficient of a reduced form.
///
/// A reduced form satisfies `|b| <= a <= sqrt(|discriminant| / 3)`, so both
/// stored coefficients fit in `ceil(ceil(bits(discriminant) / 2) / 8)` bytes.
pub fn coefficient_width(discriminant_bits: u64) -> usize {
    discriminant_bits.div_ceil(2).div_ceil(8) as usize
}

/// Total byte size of a serialized form: one flag byte, then `a` and `|b|`.
pub fn form_size(discriminant_bits: u64) -> usize {
    1 + 2 * coefficient_width(discriminant_bits)
}

pub trait BinaryQuadraticForm<Z>
where
    Z: crate::z::Z + std::fmt::Debug + Clone + PartialEq,
{
    fn new(a: &Z, b: &Z, c: &Z) -> Self;

    fn new_with_discriminant(a: &Z, b: &Z, discriminant: &Z) -> Self;

    fn a(&self) -> Z;

    fn b(&self) -> Z;

    fn c(&self) -> Z;

    fn equals(&self, other: &Self) -> bool;

    fn rho(&self) -> Self;

    fn discriminant(&self) -> Z;

    fn identity(&self) -> Self;

    fn normalize(&self) -> Self;

    fn reduce(&self) -> Self;

    fn is_normal(&self) -> bool;

    fn is_reduced(&self) -> bool;

    fn compose(&self, other: &Self) -> Self
    where
        Self: Sized,
    {
        let mut g = self.b().add(&other.b());
        g.divide_by_2_exact();
        let w = self.a().gcd(&other.a()).gcd(&g);
        let mut h = other.b().sub(&self.b());
        h.divide_by_2_exact();
        let j = Clone::clone(&w);
        let s = self.a().divide_exact(&w);
        let t = other.a().divide_exact(&w);
        let u = g.divide_exact(&w);
        let st = s.mul(&t);
        let (mu, nu) = t.mul_mod(&u, &st).solve_congruence(
            &h.mul_mod(&u, &st).add_mod(&s.mul_mod(&self.c(), &st), &st),
            &st,
        );
        let (lambda, _) = t
            .mul_mod(&nu, &s)
            .solve_congruence(&h.sub_mod(&t.mul_mod(&mu, &s), &s), &s);
        let k = mu.add(&nu.mul(&lambda));
        let l = k.mul(&t).sub(&h).divide_exact(&s);
        let m = t
            .mul(&u)
            .mul(&k)
            .sub(&h.mul(&u))
            .sub(&self.c().mul(&s))
            .divide_exact(&st);
        let b = j.mul(&u).sub(&k.mul(&t)).sub(&l.mul(&s));
        let c = k.mul(&l).sub(&j.mul(&m));
        Self::new(&st, &b, &c).reduce()
    }

    // For squaring https://www.michaelstraka.com/posts/classgroups/
    // optimization if discriminant is negative of a prime
    fn double(&self) -> Self
    where
        Self: Sized,
    {
        let (mu, _) = self.b().solve_congruence(&self.c(), &self.a());
        let a = self.a().sqr();
        let b = self.b().sub(&Z::from(2).mul(&self.a()).mul(&mu));
        let rhs = self.b().mul(&mu).sub(&self.c()).divide_exact(&self.a());
        let c = mu.sqr().sub(&rhs);
        Self::new(&a, &b, &c).reduce()
    }

    fn pow(&self, exponent: &Z) -> Self
    where
        Self: Sized + Clone,
    {
        // naive double and add
        let mut res = self.identity();
        let n = exponent.bit_size();
        for i in (0..n).rev() {
            res = res.compose(&res);
            if exponent.get_bit(i) {
                res = res.compose(self);
            }
        }
        res
    }

    fn inverse(self) -> Self;

    /// Serializes the form to its canonical fixed-width encoding.
    ///
    /// Layout: one flag byte (bit 0 set when `b` is negative), then `a` and
    /// `|b|` as zero-padded big-endian strings of [`coefficient_width`] bytes
    /// each. `c` is omitted and recomputed from the discriminant on decoding.
    ///
    /// # Panics
    ///
    /// Panics if a coefficient overflows the fixed width, which cannot happen
    /// for a reduced form.
    fn to_bytes(&self) -> Vec<u8>;

    /// Deserializes a form produced by [`Self::to_bytes`], recomputing `c`
    /// from the given discriminant.
    ///
    /// Rejects buffers of the wrong length, unknown flag bits, non-canonical
    /// sign encodings, coefficients that do not lie on the discriminant and
    /// forms that are not reduced.
    fn from_bytes(bytes: &[u8], discriminant: &Z) -> Result<Self, VdfError>
    where
        Self: Sized;
}

/// The principal form `(1, 1, (1 - discriminant) / 4)` of an odd discriminant.
pub fn identity<Z: z::Z + std::fmt::Debug + Clone + PartialEq>(discriminant: &Z) -> BQF<Z> {
    BQF::new_with_discriminant(&Z::from(1), &Z::from(1), discriminant)
}

/// The classic base element `(2, 1, (1 - discriminant) / 8)`, reduced.
///
/// Only defined for discriminants congruent to 1 modulo 8, which holds for
/// every discriminant produced by [`crate::create_discriminant`].
pub fn generator<Z: z::Z + std::fmt::Debug + Clone + PartialEq>(discriminant: &Z) -> BQF<Z> {
    BQF::new_with_discriminant(&Z::from(2), &Z::from(1), discriminant).reduce()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BQF<Z>
where
    Z: crate::z::Z,
{
    a: Z,
    b: Z,
    c: Z,
}

impl<Z: z::Z + std::fmt::Debug + std::clone::Clone + std::cmp::PartialEq> BinaryQuadraticForm<Z>
    for BQF<Z>
{
    fn new(a: &Z, b: &Z, c: &Z) -> Self {
        BQF {
            a: Clone::clone(a),
            b: Clone::clone(b),
            c: Clone::clone(c),
        }
    }

    fn new_with_discriminant(a: &Z, b: &Z, discriminant: &Z) -> Self {
        let mut c = b.sqr().sub(discriminant).divide_exact(a);
        c.divide_by_4_exact();
        BQF {
            a: Clone::clone(a),
            b: Clone::clone(b),
            c,
        }
    }

    fn a(&self) -> Z {
        self.a.clone()
    }

    fn b(&self) -> Z {
        self.b.clone()
    }

    fn c(&self) -> Z {
        self.c.clone()
    }

    fn equals(&self, other: &Self) -> bool {
        self.a.eq(&other.a) && self.b.eq(&other.b) && self.c.eq(&other.c)
    }

    fn discriminant(&self) -> Z {
        self.b.sqr().sub(&Z::from(4).mul(&self.a.mul(&self.c)))
    }

    fn identity(&self) -> Self {
        let disc = self.discriminant();
        let b = if self.b.is_odd() {
            Z::from(1)
        } else {
            Z::from(0)
        };
        let mut c = Clone::clone(&b.sub(&disc));
        c.divide_by_4_exact();
        BQF {
            a: Z::from(1),
            b,
            c,
        }
    }

    fn inverse(self) -> Self {
        BQF {
            a: self.a,
            b: self.b.neg(),
            c: self.c,
        }
        .reduce()
    }

    fn normalize(&self) -> Self {
        let z::EuclideanDivResult {
            mut quotient,
            mut remainder,
        } = self.b.euclidean_div_ceil(&self.a);
        if quotient.is_odd() {
            remainder = remainder.add(&self.a)
        };
        quotient.divide_by_2();

        let b = remainder.clone();

        remainder = self.b.add(&remainder);
        remainder.divide_by_2();
        let c = self.c.sub(&quotient.mul(&remainder));
        BQF {
            a: self.a.clone(),
            b,
            c,
        }
    }

    fn rho(&self) -> Self {
        BQF {
            a: self.c.clone(),
            b: self.b.clone().neg(),
            c: self.a.clone(),
        }
        .normalize()
    }

    fn reduce(&self) -> BQF<Z> {
        let mut n;
        if !self.is_normal() {
            n = self.normalize()
        } else {
            n = self.clone()
        };
        let mut cmp;
        while {
            cmp = n.a.compare(&n.c);
            cmp == Greater
        } {
            n = n.rho();
        }
        if cmp == Equal && !n.b.is_positive() {
            n.b.oppose();
        }
        n
    }

    fn is_normal(&self) -> bool {
        self.b.compare(&self.a).is_le() && self.b.compare(&self.a.neg()).is_gt()
    }

    fn is_reduced(&self) -> bool {
        self.is_normal()
            && self.a.compare(&self.c).is_le()
            && !(self.a.eq(&self.c) && self.b.compare(&Z::zero()).is_lt())
    }

    fn to_bytes(&self) -> Vec<u8> {
        let width = coefficient_width(self.discriminant().bit_size());
        let (a_bytes, _) = self.a.to_bytes_be();
        let (b_bytes, b_positive) = self.b.to_bytes_be();
        assert!(a_bytes.len() <= width && b_bytes.len() <= width);
        let mut bytes = vec![0u8; 1 + 2 * width];
        if !b_positive && !b_bytes.is_empty() {
            bytes[0] |= FLAG_B_NEGATIVE;
        }
        bytes[1 + width - a_bytes.len()..1 + width].copy_from_slice(&a_bytes);
        bytes[1 + 2 * width - b_bytes.len()..].copy_from_slice(&b_bytes);
        bytes
    }

    fn from_bytes(bytes: &[u8], discriminant: &Z) -> Result<Self, VdfError> {
        let width = coefficient_width(discriminant.bit_size());
        if bytes.len() != 1 + 2 * width {
            return Err(VdfError::Encoding("form buffer has the wrong length"));
        }
        let flags = bytes[0];
        if flags & !FLAG_B_NEGATIVE != 0 {
            return Err(VdfError::Encoding("unknown flag bits"));
        }
        let b_magnitude = &bytes[1 + width..];
        if flags == FLAG_B_NEGATIVE && b_magnitude.iter().all(|&byte| byte == 0) {
            return Err(VdfError::Encoding("negative zero coefficient"));
        }
        let a = Z::from_bytes_be(bytes[1..1 + width].to_vec(), true);
        let b = Z::from_bytes_be(b_magnitude.to_vec(), flags & FLAG_B_NEGATIVE == 0);
        if !a.is_positive() {
            return Err(VdfError::Form("leading coefficient must be positive"));
        }
        let numerator = b.sqr().sub(discriminant);
        let denominator = Z::from(4).mul(&a);
        if !denominator.divides(&numerator) {
            return Err(VdfError::Form("coefficients do not match the discriminant"));
        }
        let c = numerator.divide_exact(&denominator);
        let form = BQF { a, b, c };
        if !form.is_reduced() {
            return Err(VdfError::Form("form is not reduced"));
        }
        Ok(form)
    }
}

#[cfg(test)]
#[cfg(feature = "gmp")]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rug::Integer;

    fn form(a: i64, b: i64, c: i64) -> BQF<Integer> {
        BQF::new(&Integer::from(a), &Integer::from(b), &Integer::from(c))
    }

    // The class group of discriminant -23 is cyclic of order 3, generated by
    // (2, 1, 3). Small enough to check composition against pen and paper.
    const D23: i64 = -23;

    #[test]
    fn test_reduce_small_form() {
        let f = form(4, -3, 2);
        assert_eq!(f.discriminant(), Integer::from(D23));
        assert!(!f.is_reduced());
        let r = f.reduce();
        assert!(r.equals(&form(2, -1, 3)));
        assert_eq!(r.discriminant(), Integer::from(D23));
        // reduction is idempotent
        assert!(r.reduce().equals(&r));
    }

    #[test]
    fn test_identity_element() {
        let g = form(2, 1, 3);
        let e = g.identity();
        assert!(e.equals(&form(1, 1, 6)));
        assert!(e.is_reduced());
        assert!(g.compose(&e).equals(&g));
        assert!(e.compose(&e).equals(&e));
        assert!(identity::<Integer>(&Integer::from(D23)).equals(&e));
    }

    #[test]
    fn test_composition_cycle() {
        let g = generator::<Integer>(&Integer::from(D23));
        assert!(g.equals(&form(2, 1, 3)));
        let g2 = g.compose(&g);
        assert!(g2.equals(&form(2, -1, 3)));
        let g3 = g2.compose(&g);
        assert!(g3.equals(&g.identity()));
        assert!(g.double().equals(&g2));
        assert!(g.clone().inverse().equals(&g2));
    }

    #[test]
    fn test_pow_matches_repeated_composition() {
        let g = generator::<Integer>(&Integer::from(-47));
        assert!(g.equals(&form(2, 1, 6)));
        assert!(g.pow(&Integer::from(0)).equals(&g.identity()));
        assert!(g.pow(&Integer::from(1)).equals(&g));
        let mut acc = g.clone();
        for n in 2u64..8 {
            acc = acc.compose(&g);
            assert!(g.pow(&Integer::from(n)).equals(&acc));
        }
    }

    #[test]
    fn test_codec_roundtrip() {
        let d = Integer::from(D23);
        for f in [
            identity::<Integer>(&d),
            generator::<Integer>(&d),
            generator::<Integer>(&d).double(),
        ] {
            let bytes = f.to_bytes();
            assert_eq!(bytes.len(), form_size(d.significant_bits() as u64));
            let decoded = BQF::from_bytes(&bytes, &d).unwrap();
            assert!(decoded.equals(&f));
        }
    }

    #[test]
    fn test_codec_rejects_malformed_buffers() {
        let d = Integer::from(D23);
        let bytes = generator::<Integer>(&d).to_bytes();
        assert!(matches!(
            BQF::<Integer>::from_bytes(&bytes[..2], &d),
            Err(VdfError::Encoding(_))
        ));
        let mut unknown_flag = bytes.clone();
        unknown_flag[0] |= 0x80;
        assert!(matches!(
            BQF::<Integer>::from_bytes(&unknown_flag, &d),
            Err(VdfError::Encoding(_))
        ));
        // (4, -3, 2) lies on the discriminant but is not reduced
        assert!(matches!(
            BQF::<Integer>::from_bytes(&[1, 4, 3], &d),
            Err(VdfError::Form(_))
        ));
        // an even b cannot lie on an odd discriminant
        assert!(matches!(
            BQF::<Integer>::from_bytes(&[0, 2, 0], &d),
            Err(VdfError::Form(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_pow_is_homomorphic(m in 0u64..128, n in 0u64..128) {
            let g = generator::<Integer>(&Integer::from(-2039));
            let lhs = g.pow(&Integer::from(m)).compose(&g.pow(&Integer::from(n)));
            let rhs = g.pow(&Integer::from(m + n));
            prop_assert!(lhs.equals(&rhs));
        }

        #[test]
        fn test_pow_stays_reduced_and_on_discriminant(n in 0u64..4096) {
            let d = Integer::from(-2039);
            let f = generator::<Integer>(&d).pow(&Integer::from(n));
            prop_assert!(f.is_reduced());
            prop_assert_eq!(f.discriminant(), d.clone());
            let decoded = BQF::from_bytes(&f.to_bytes(), &d).unwrap();
            prop_assert!(decoded.equals(&f));
        }
    }
}
