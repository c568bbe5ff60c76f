// SPDX-FileCopyrightText: 2024 Nomadic Labs <contact@nomadic-labs.com>
//
// SPDX-License-Identifier: MIT

//! Arbitrary precision signed big integer (GMP backend).

use core::cmp::Ordering;
use std::cmp::Ordering::Less;
use std::ops::{AddAssign, ShrAssign};

pub use rug::Integer;
use rug::integer::{IntegerExt64, IsPrime};
use rug::ops::DivRoundingAssign;
use rug::ops::NegAssign;
use rug::Complete;

use crate::z::EuclideanDivResult;

/// Number of Miller-Rabin rounds for the probabilistic primality test.
const PRIMALITY_TEST_REPS: u32 = 30;

impl crate::z::Z for rug::Integer {
    fn zero() -> Self {
        <Self as From<u64>>::from(0u64)
    }

    fn to_string(&self) -> String {
        Integer::to_string_radix(self, 10)
    }

    fn from(n: u64) -> Self {
        <Self as From<u64>>::from(n)
    }

    fn from_string(s: &str, base: u64) -> Self {
        Integer::from_str_radix(s, base as i32).unwrap()
    }

    fn from_bytes_be(b: Vec<u8>, positive: bool) -> Self {
        let res = Integer::from_digits(&b, rug::integer::Order::Msf);
        if !positive {
            res.neg()
        } else {
            res
        }
    }

    fn to_bytes_be(&self) -> (Vec<u8>, bool) {
        (
            Integer::to_digits::<u8>(self, rug::integer::Order::Msf),
            self.is_positive(),
        )
    }

    fn to_u64(&self) -> Option<u64> {
        Integer::to_u64(self)
    }

    fn eq_abs(&self, rhs: &Self) -> bool {
        self.cmp_abs(rhs) == Ordering::Equal
    }

    fn add(&self, rhs: &Self) -> Self {
        (self + rhs).complete()
    }

    fn sub(&self, rhs: &Self) -> Self {
        (self - rhs).complete()
    }

    fn mul(&self, rhs: &Self) -> Self {
        (self * rhs).complete()
    }

    fn sqr(&self) -> Self {
        self.square_ref().complete()
    }

    fn neg(&self) -> Self {
        (-self).complete()
    }

    fn divide_by_2_exact(&mut self) {
        self.div_exact_u_mut(2)
    }

    fn divide_by_2(&mut self) {
        rug::Integer::shr_assign(self, 1u32)
    }

    fn divide_by_4_exact(&mut self) {
        self.div_exact_u_mut(4)
    }

    fn is_odd(&self) -> bool {
        self.is_odd()
    }

    fn euclidean_div_ceil(&self, other: &Self) -> crate::z::EuclideanDivResult<Self>
    where
        Self: Sized,
    {
        let (q, r) = self.div_rem_ceil_ref(other).complete();
        EuclideanDivResult {
            quotient: q,
            remainder: r,
        }
    }

    fn oppose(&mut self) {
        self.neg_assign()
    }

    fn is_positive(&self) -> bool {
        self.is_positive()
    }

    fn gcd(&self, other: &Self) -> Self {
        self.gcd_ref(other).complete()
    }

    fn extended_gcd(&self, other: &Self) -> (Self, Self, Self)
    where
        Self: Sized,
    {
        self.extended_gcd_ref(other).complete()
    }

    fn divide_exact(&self, other: &Self) -> Self {
        self.div_exact_ref(other).complete()
    }

    fn divides(&self, other: &Self) -> bool {
        other.is_divisible(self)
    }

    fn add_mod(&self, other: &Self, modulo: &Self) -> Self {
        (self + other).complete().modulo(modulo)
    }

    fn sub_mod(&self, other: &Self, modulo: &Self) -> Self {
        (self - other).complete().modulo_ref(modulo).complete()
    }

    fn take_mod(&self, modulo: &Self) -> Self {
        self.modulo_ref(modulo).complete()
    }

    fn mul_mod(&self, other: &Self, modulo: &Self) -> Self {
        (self * other).complete().modulo_ref(modulo).complete()
    }

    fn pow_mod(&self, exponent: &Self, modulo: &Self) -> Self {
        self.pow_mod_ref(exponent, modulo).unwrap().into()
    }

    fn div_floor(&self, other: &Self) -> Self {
        let mut x = self.clone();
        x.div_floor_assign(other);
        x
    }

    fn bit_size(&self) -> u64 {
        Integer::significant_bits_64(self)
    }

    fn get_bit(&self, index: u64) -> bool {
        Integer::get_bit_64(self, index)
    }

    fn is_prime(&self) -> bool {
        self.is_probably_prime(PRIMALITY_TEST_REPS) != IsPrime::No
    }

    fn kronecker(&self, other: &Self) -> i32 {
        Integer::kronecker(self, other)
    }

    fn invert_mod(&self, modulo: &Self) -> Option<Self>
    where
        Self: Sized,
    {
        self.invert_ref(modulo).map(|b| b.into())
    }

    fn compare(&self, other: &Self) -> Ordering {
        Integer::cmp(self, other)
    }

    fn sqrt_mod_prime(&self, prime: &Self) -> Option<Self> {
        // Shanks-Tonelli
        if self == &Integer::ZERO {
            return Some(Integer::ZERO);
        }

        // Check if a is a quadratic residue modulo p
        if self.legendre(prime) != 1 {
            return None;
        }

        if prime.take_mod(&4u32.into()) == 3u32 {
            let exp: Integer = (prime.add(&1.into())).div_exact_u(4);
            return Some(self.pow_mod_ref(&exp, prime).unwrap().into());
        }

        // Find n such that n is a quadratic non-residue modulo p
        let mut n: Integer = 2u32.into();
        while n.compare(prime) == Less {
            if n.legendre(prime) == -1 {
                break;
            }
            n += 1;
        }

        // p - 1 = 2^s * q
        let mut q = (prime - Integer::ONE).complete();
        let mut s: i32 = 0;
        while q.is_even() {
            q >>= 1;
            s += 1;
        }

        let inv_prime = self.invert_mod(prime).unwrap();

        let r =
            <Integer as From<_>>::from(self.pow_mod_ref(&((q.clone() + 1) >> 1), prime).unwrap());
        let y = r
            .sqr()
            .take_mod(prime)
            .mul_mod(&inv_prime, prime)
            .take_mod(prime);
        let b: Integer = n.pow_mod_ref(&q, prime).unwrap().into();
        let mut j = Integer::ZERO.clone();

        // Calculate the power j of b such that b^(2*j)*r^2/a = 1 mod p.
        for k in 0..=(s - 2) {
            let exp = <Integer as From<_>>::from(Integer::ONE << ((s - 2 - k) as u32));
            let b_pow =
                <Integer as From<_>>::from(b.pow_mod_ref(&(j.clone() << 1), prime).unwrap());
            let b_pow = <Integer as From<_>>::from(
                b_pow.mul_mod(&y, prime).pow_mod_ref(&exp, prime).unwrap(),
            );
            if b_pow != 1 {
                j.add_assign(<Integer as From<_>>::from(Integer::ONE << k));
            }
        }

        // b^(2*j)*r^2/a = 1 mod p => (b^j*r)^2 = a mod p.
        Some(
            <Integer as From<_>>::from(b.pow_mod_ref(&j, prime).unwrap())
                .mul(&r)
                .take_mod(prime),
        )
    }

    fn abs(&self) -> Self {
        Integer::abs_ref(self).complete()
    }

    fn shl(&self, n: u32) -> Self {
        (self << n).complete()
    }
}
