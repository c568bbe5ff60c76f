// SPDX-FileCopyrightText: 2024 Nomadic Labs <contact@nomadic-labs.com>
//
// SPDX-License-Identifier: MIT

//! Signed big integer trait.

use std::cmp::Ordering;

#[derive(Debug)]
pub struct EuclideanDivResult<Z> {
    pub quotient: Z,
    pub remainder: Z,
}

/// A trait defining operations for arbitrary-precision integers.
///
/// This trait provides the arithmetic, modular arithmetic and number theory
/// operations needed to work in class groups of negative discriminant.
///
/// Invalid values for the arguments of the functions below can trigger exceptions.
pub trait Z {
    fn zero() -> Self;

    fn to_string(&self) -> String;

    fn from(n: u64) -> Self
    where
        Self: Sized;

    /// Constructs an integer from a string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - A string slice representing the number.
    /// * `base` - The base of the number system (e.g., 10 for decimal, 16 for hexadecimal).
    ///
    /// # Returns
    ///
    /// An integer representation of the string.
    fn from_string(s: &str, base: u64) -> Self;

    /// Constructs an integer from a vector of bytes in big-endian order.
    ///
    /// # Arguments
    ///
    /// * `b` - A vector of bytes representing the magnitude of the integer.
    /// * `positive` - A boolean indicating if the integer is positive.
    ///
    /// # Returns
    ///
    /// An integer representation of the byte vector.
    fn from_bytes_be(b: Vec<u8>, positive: bool) -> Self;

    /// Converts the integer to a vector of bytes in big-endian order.
    ///
    /// # Returns
    ///
    /// A tuple containing a vector of bytes and a boolean indicating if the integer is positive.
    fn to_bytes_be(&self) -> (Vec<u8>, bool);

    /// Converts the integer to a machine word if it fits.
    ///
    /// # Returns
    ///
    /// `Some(n)` if the integer is non-negative and fits in a `u64`, otherwise `None`.
    fn to_u64(&self) -> Option<u64>;

    /// Compares the absolute values of two integers for equality.
    ///
    /// # Arguments
    ///
    /// * `rhs` - The integer to compare against.
    ///
    /// # Returns
    ///
    /// `true` if the absolute values of `self` and `rhs` are equal, otherwise `false`.
    fn eq_abs(&self, rhs: &Self) -> bool;

    /// Adds another integer to this integer.
    fn add(&self, rhs: &Self) -> Self;

    /// Subtracts another integer from this integer.
    fn sub(&self, rhs: &Self) -> Self;

    /// Multiplies this integer by another integer.
    fn mul(&self, rhs: &Self) -> Self;

    /// Squares this integer.
    fn sqr(&self) -> Self;

    /// Negates this integer.
    fn neg(&self) -> Self;

    /// Performs an exact division of the integer by 2.
    fn divide_by_2_exact(&mut self);

    /// Performs an exact division of the integer by 4.
    fn divide_by_4_exact(&mut self);

    /// Divides the integer by 2 and modifies it in place.
    fn divide_by_2(&mut self);

    /// Checks if the integer is odd.
    fn is_odd(&self) -> bool;

    /// Performs Euclidean division with rounding towards +infinity.
    ///
    /// The remainder gets the opposite sign of the denominator.
    ///
    /// # Arguments
    ///
    /// * `other` - The divisor integer.
    ///
    /// # Returns
    ///
    /// A result containing the quotient and remainder.
    fn euclidean_div_ceil(&self, other: &Self) -> EuclideanDivResult<Self>
    where
        Self: Sized;

    /// Negates the integer in place.
    fn oppose(&mut self);

    /// Checks if the integer is strictly positive.
    fn is_positive(&self) -> bool;

    /// Computes the greatest common divisor (GCD) of this integer and another integer.
    ///
    /// # Arguments
    ///
    /// * `other` - The integer to compute the GCD with.
    ///
    /// # Returns
    ///
    /// The GCD of the two integers.
    fn gcd(&self, other: &Self) -> Self;

    /// Computes the extended GCD of this integer and another integer.
    ///
    /// This method returns a tuple `(gcd, x, y)` such that `gcd = x * self + y * other`.
    ///
    /// # Arguments
    ///
    /// * `other` - The integer to compute the extended GCD with.
    ///
    /// # Returns
    ///
    /// A tuple containing the GCD and the coefficients x and y: `(gcd, x, y)`.
    fn extended_gcd(&self, other: &Self) -> (Self, Self, Self)
    where
        Self: Sized;

    /// Divides this integer by another integer, assuming the division is exact.
    ///
    /// # Arguments
    ///
    /// * `other` - The divisor integer.
    ///
    /// # Returns
    ///
    /// The quotient of the division.
    fn divide_exact(&self, other: &Self) -> Self;

    /// Checks if this integer divides another integer exactly.
    ///
    /// # Arguments
    ///
    /// * `other` - The integer to check divisibility.
    ///
    /// # Returns
    ///
    /// `true` if `self` divides `other` exactly, otherwise `false`.
    fn divides(&self, other: &Self) -> bool;

    /// Adds another integer modulo a given modulo.
    fn add_mod(&self, other: &Self, modulo: &Self) -> Self;

    /// Subtracts another integer modulo a given modulo.
    fn sub_mod(&self, other: &Self, modulo: &Self) -> Self;

    /// Takes the modulo of this integer.
    ///
    /// # Arguments
    ///
    /// * `modulo` - The modulus.
    ///
    /// # Returns
    ///
    /// The result of taking `self` modulo `modulo`, in `[0, modulo)`.
    fn take_mod(&self, modulo: &Self) -> Self;

    /// Multiplies this integer by another integer modulo a given modulo.
    fn mul_mod(&self, other: &Self, modulo: &Self) -> Self;

    /// Raises this integer to a power modulo a given modulo.
    ///
    /// # Arguments
    ///
    /// * `exponent` - The non-negative exponent.
    /// * `modulo` - The modulus.
    ///
    /// # Returns
    ///
    /// The result of `self^exponent mod modulo`.
    fn pow_mod(&self, exponent: &Self, modulo: &Self) -> Self;

    /// Solves a congruence equation `self * x ≡ other (mod modulo)` for `x`.
    ///
    /// # Arguments
    ///
    /// * `other` - The right-hand side of the congruence.
    /// * `modulo` - The modulus.
    ///
    /// # Returns
    ///
    /// A tuple `(x, factor)` where `x` is a solution to the congruence and `factor` is the factor
    /// by which solutions differ.
    ///
    /// # Panics
    ///
    /// Panics if there is no solution to the congruence.
    fn solve_congruence(&self, other: &Self, modulo: &Self) -> (Self, Self)
    where
        Self: Sized,
    {
        let (gcd, s, _) = self.extended_gcd(modulo);
        let r = other.take_mod(&gcd);
        // a solution exists iff other is divisible by the GCD of self and modulo
        if !r.eq_abs(&Self::zero()) {
            panic!("no solution");
        };
        // The solutions are of the form
        // for i=1 to gcd-1: (other/gcd)*s+i*(modulo/gcd)
        (
            other.divide_exact(&gcd).mul_mod(&s, modulo),
            modulo.divide_exact(&gcd),
        )
    }

    /// Divides this integer by another integer and rounds towards negative infinity.
    fn div_floor(&self, other: &Self) -> Self;

    /// Returns the bit size of the integer.
    ///
    /// # Returns
    ///
    /// The number of bits needed to represent the absolute value of the integer.
    fn bit_size(&self) -> u64;

    /// Gets the bit value at a specific index.
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the bit to retrieve.
    ///
    /// # Returns
    ///
    /// `true` if the bit is set, otherwise `false`.
    fn get_bit(&self, index: u64) -> bool;

    /// Runs a probabilistic primality test on the integer.
    ///
    /// # Returns
    ///
    /// `true` if the integer is (probably) prime, otherwise `false`.
    fn is_prime(&self) -> bool;

    /// Computes the Kronecker symbol of two integers.
    /// See [https://mathworld.wolfram.com/KroneckerSymbol.html].
    ///
    /// # Arguments
    ///
    /// * `other` - The integer to compute the Kronecker symbol with.
    ///
    /// # Returns
    ///
    /// The Kronecker symbol of the two integers.
    fn kronecker(&self, other: &Self) -> i32;

    /// Computes the modular inverse of this integer with respect to a given modulus.
    ///
    /// # Arguments
    ///
    /// * `modulo` - The modulus.
    ///
    /// # Returns
    ///
    /// An `Option` containing the modular inverse if it exists, otherwise `None`.
    fn invert_mod(&self, modulo: &Self) -> Option<Self>
    where
        Self: Sized;

    /// Compares this integer with another integer.
    ///
    /// # Arguments
    ///
    /// * `other` - The integer to compare against.
    ///
    /// # Returns
    ///
    /// An `Ordering` indicating the relative order of the two integers.
    fn compare(&self, other: &Self) -> Ordering;

    /// Computes the square root modulo a prime number.
    ///
    /// # Arguments
    ///
    /// * `prime` - The prime modulus.
    ///
    /// # Returns
    ///
    /// An `Option` containing the square root modulo `prime` if it exists, otherwise `None`.
    fn sqrt_mod_prime(&self, prime: &Self) -> Option<Self>
    where
        Self: Sized;

    /// Computes the absolute value of the integer.
    fn abs(&self) -> Self;

    /// Performs a left bit shift on the integer.
    ///
    /// # Arguments
    ///
    /// * `n` - The number of positions to shift.
    ///
    /// # Returns
    ///
    /// The result of the left bit shift.
    fn shl(&self, n: u32) -> Self;
}
