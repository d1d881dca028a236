//! # Vector operations for Vec2
//! This module provides implementations of various mathematical operations
//! for the `Vec2` struct, including addition, subtraction, scalar multiplication,
//! scalar division, and negation. These operations are implemented using Rust's
//! operator overloading traits (`Add`, `Sub`, `Mul`, `Div`, `Neg`).

use super::Vec2;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Vector addition
///
/// Adds corresponding components of two vectors. This consumes both input
/// vectors and returns a new vector containing the sum.
///
/// # Examples
/// ```
/// # use evacuation_lib::vector::Vec2;
/// let a = Vec2::new(1.0, 2.0);
/// let b = Vec2::new(4.0, 5.0);
/// let sum = a + b;
/// assert_eq!(sum, Vec2::new(5.0, 7.0));
/// ```
impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Vec2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

/// Vector addition by reference (&Vec2 + &Vec2).
///
/// More efficient for cases where you want to preserve the original vectors.
/// This is the most common pattern in force loops where vectors are reused
/// across multiple operations.
///
/// # Examples
/// ```
/// # use evacuation_lib::vector::Vec2;
/// let position = Vec2::new(10.0, 5.0);
/// let velocity = Vec2::new(1.0, -0.5);
/// let new_position = &position + &velocity; // Originals preserved
/// ```
impl Add for &Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: &Vec2) -> Self::Output {
        Vec2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

/// In-place vector addition (Vec2 += Vec2).
///
/// Accumulates the right-hand side into this vector. Force accumulation
/// across the driving, repulsion, wall, and hazard terms uses this form.
///
/// # Examples
/// ```
/// # use evacuation_lib::vector::Vec2;
/// let mut total = Vec2::zero();
/// total += Vec2::new(1.0, 0.5);
/// total += Vec2::new(-0.5, 0.5);
/// assert_eq!(total, Vec2::new(0.5, 1.0));
/// ```
impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

/// Vector subtraction by value (Vec2 - Vec2).
///
/// Subtracts corresponding components. The result represents the displacement
/// vector from the second vector to the first.
///
/// # Examples
/// ```
/// # use evacuation_lib::vector::Vec2;
/// let a = Vec2::new(5.0, 7.0);
/// let b = Vec2::new(1.0, 2.0);
/// let difference = a - b;
/// assert_eq!(difference, Vec2::new(4.0, 5.0));
/// ```
impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Vec2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Vector subtraction by reference (&Vec2 - &Vec2).
///
/// Efficient subtraction that preserves original vectors. Commonly used
/// for calculating displacement vectors between positions.
///
/// # Examples
/// ```
/// # use evacuation_lib::vector::Vec2;
/// let target = Vec2::new(10.0, 5.0);
/// let current = Vec2::new(8.0, 3.0);
/// let direction = &target - &current; // Points from current to target
/// ```
impl Sub for &Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: &Vec2) -> Self::Output {
        Vec2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Scalar multiplication by value (Vec2 * f64).
///
/// Scales all vector components by the same factor. Commonly used for
/// applying time steps, scaling forces, or changing magnitudes.
///
/// # Examples
/// ```
/// # use evacuation_lib::vector::Vec2;
/// let velocity = Vec2::new(2.0, -1.0);
/// let dt = 0.1;
/// let displacement = velocity * dt;
/// assert_eq!(displacement, Vec2::new(0.2, -0.1));
/// ```
impl Mul<f64> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self::Output {
        Vec2 {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// Scalar multiplication by reference (&Vec2 * f64).
///
/// Efficient scaling that preserves the original vector. Useful when the
/// same vector needs to be scaled multiple times or used elsewhere.
impl Mul<f64> for &Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f64) -> Self::Output {
        Vec2 {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// Commutative scalar multiplication by value (f64 * Vec2).
///
/// Allows writing scalar multiplication in natural mathematical notation.
/// Equivalent to Vec2 * f64 but reads more naturally in many contexts.
///
/// # Examples
/// ```
/// # use evacuation_lib::vector::Vec2;
/// let direction = Vec2::new(0.0, -1.0);
/// let speed = 1.4;
/// let velocity = speed * direction; // Natural physics notation
/// ```
impl Mul<Vec2> for f64 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: Vec2) -> Self::Output {
        Vec2 {
            x: self * rhs.x,
            y: self * rhs.y,
        }
    }
}

/// Commutative scalar multiplication by reference (f64 * &Vec2).
///
/// Efficient commutative multiplication that preserves the original vector.
impl Mul<&Vec2> for f64 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: &Vec2) -> Self::Output {
        Vec2 {
            x: self * rhs.x,
            y: self * rhs.y,
        }
    }
}

/// Scalar division by value (Vec2 / f64).
///
/// Divides all components by the scalar. The implementation uses
/// multiplication by reciprocal.
///
/// # Examples
/// ```
/// # use evacuation_lib::vector::Vec2;
/// let position = Vec2::new(10.0, 20.0);
/// let center = position / 2.0;
/// assert_eq!(center, Vec2::new(5.0, 10.0));
/// ```
impl Div<f64> for Vec2 {
    type Output = Self;
    #[inline]
    fn div(self, rhs: f64) -> Self::Output {
        let inv = rhs.recip();
        Vec2 {
            x: self.x * inv,
            y: self.y * inv,
        }
    }
}

/// Scalar division by reference (&Vec2 / f64).
///
/// Efficient division that preserves the original vector.
impl Div<f64> for &Vec2 {
    type Output = Vec2;
    #[inline]
    fn div(self, rhs: f64) -> Self::Output {
        let inv = rhs.recip();
        Vec2 {
            x: self.x * inv,
            y: self.y * inv,
        }
    }
}

/// Vector negation by value (-Vec2).
///
/// Returns a vector pointing in the opposite direction with the same
/// magnitude. Commonly used for reversing repulsion directions.
///
/// # Examples
/// ```
/// # use evacuation_lib::vector::Vec2;
/// let toward_hazard = Vec2::new(2.0, -1.0);
/// let away = -toward_hazard;
/// assert_eq!(away, Vec2::new(-2.0, 1.0));
/// ```
impl Neg for Vec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self::Output {
        Vec2 {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// Vector negation by reference (-&Vec2).
///
/// Efficient negation that preserves the original vector.
impl Neg for &Vec2 {
    type Output = Vec2;
    #[inline]
    fn neg(self) -> Self::Output {
        Vec2 {
            x: -self.x,
            y: -self.y,
        }
    }
}
