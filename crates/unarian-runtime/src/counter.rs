//! Counter arithmetic abstraction.
//!
//! The VM is generic over the counter representation. [`BigUint`] gives the
//! language its default arbitrary-precision semantics; `u64` backs the
//! fixed-precision mode, where the decimal parse rejects inputs that do not
//! fit and runtime arithmetic wraps at 2^64 like the original unsigned
//! 64-bit counter.

use std::fmt;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

/// The arithmetic capability set required of a counter representation.
///
/// All operations are in-place where they mutate; fallible operations
/// (decrement below zero, inexact division) report failure through their
/// return value and leave the counter in an unspecified but valid state —
/// the VM discards it on failure.
pub trait Counter: Clone + PartialEq + fmt::Display {
    /// Convert a pooled compile-time constant. `None` when the constant
    /// does not fit this representation.
    fn from_const(value: &BigUint) -> Option<Self>;

    /// Parse a decimal string. `None` on malformed digits or overflow.
    fn from_decimal(text: &str) -> Option<Self>;

    /// The counter 0.
    fn zero() -> Self;

    /// The counter 1.
    fn one() -> Self;

    fn is_zero(&self) -> bool;

    /// Add one.
    fn increment(&mut self);

    /// Subtract one; false when the counter is already zero.
    fn decrement(&mut self) -> bool;

    /// Add a constant.
    fn add(&mut self, n: &Self);

    /// Subtract a constant; false when the counter is smaller.
    fn sub_checked(&mut self, n: &Self) -> bool;

    /// Multiply by a constant.
    fn mul(&mut self, n: &Self);

    /// Divide by a constant ≥ 1, truncating.
    fn div_floor(&mut self, n: &Self);

    /// Divide by a constant ≥ 1; false unless the division is exact.
    fn div_exact(&mut self, n: &Self) -> bool;

    /// Whether the counter is congruent to `rem` modulo `modulus` (≥ 1).
    fn mod_equals(&self, rem: &Self, modulus: &Self) -> bool;
}

impl Counter for BigUint {
    fn from_const(value: &BigUint) -> Option<Self> {
        Some(value.clone())
    }

    fn from_decimal(text: &str) -> Option<Self> {
        text.parse().ok()
    }

    fn zero() -> Self {
        Zero::zero()
    }

    fn one() -> Self {
        One::one()
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }

    fn increment(&mut self) {
        *self += 1u32;
    }

    fn decrement(&mut self) -> bool {
        if Zero::is_zero(self) {
            return false;
        }
        *self -= 1u32;
        true
    }

    fn add(&mut self, n: &Self) {
        *self += n;
    }

    fn sub_checked(&mut self, n: &Self) -> bool {
        if *self < *n {
            return false;
        }
        *self -= n;
        true
    }

    fn mul(&mut self, n: &Self) {
        *self *= n;
    }

    fn div_floor(&mut self, n: &Self) {
        *self /= n;
    }

    fn div_exact(&mut self, n: &Self) -> bool {
        let (quotient, remainder) = self.div_rem(n);
        if !Zero::is_zero(&remainder) {
            return false;
        }
        *self = quotient;
        true
    }

    fn mod_equals(&self, rem: &Self, modulus: &Self) -> bool {
        self % modulus == *rem
    }
}

impl Counter for u64 {
    fn from_const(value: &BigUint) -> Option<Self> {
        u64::try_from(value).ok()
    }

    fn from_decimal(text: &str) -> Option<Self> {
        text.parse().ok()
    }

    fn zero() -> Self {
        0
    }

    fn one() -> Self {
        1
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }

    fn increment(&mut self) {
        *self = self.wrapping_add(1);
    }

    fn decrement(&mut self) -> bool {
        match self.checked_sub(1) {
            Some(n) => {
                *self = n;
                true
            }
            None => false,
        }
    }

    fn add(&mut self, n: &Self) {
        *self = self.wrapping_add(*n);
    }

    fn sub_checked(&mut self, n: &Self) -> bool {
        match self.checked_sub(*n) {
            Some(result) => {
                *self = result;
                true
            }
            None => false,
        }
    }

    fn mul(&mut self, n: &Self) {
        *self = self.wrapping_mul(*n);
    }

    fn div_floor(&mut self, n: &Self) {
        *self /= n;
    }

    fn div_exact(&mut self, n: &Self) -> bool {
        if *self % *n != 0 {
            return false;
        }
        *self /= n;
        true
    }

    fn mod_equals(&self, rem: &Self, modulus: &Self) -> bool {
        *self % *modulus == *rem
    }
}
