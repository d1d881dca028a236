//! # 2D Vector Mathematics Module
//!
//! This module provides a planar vector implementation for the evacuation
//! solvers and particle systems. The `Vec2` struct offers vector operations
//! with both value and reference semantics to minimize allocations in
//! performance-critical force loops.
//!
//! ## Example Usage
//! ```
//! use evacuation_lib::vector::Vec2;
//!
//! // Create vectors
//! let position = Vec2::new(5.0, 8.0);
//! let velocity = Vec2::new(0.5, -1.0);
//!
//! // Vector operations
//! let new_position = position + velocity * 0.1;
//! let distance = (position - new_position).norm();
//!
//! // Physics calculations
//! let direction = velocity.normalize();
//! let capped = velocity.clamp_norm(1.4);
//! ```
// Numerical Operations Definition
pub mod ops;
// Helper Functions for Vec2 struct
pub mod math;

/// A 2D vector in Cartesian coordinates for planar crowd dynamics.
///
/// `Vec2` represents a point, direction, or force in the floor-plan plane
/// using double-precision floating-point components. It implements `Copy`
/// for efficient passing and provides the mathematical operations needed by
/// the social-force integrator and the grid solvers.
///
/// # Fields
/// - `x`: The X-component (meters, east)
/// - `y`: The Y-component (meters, north)
///
/// # Examples
/// ```
/// # use evacuation_lib::vector::Vec2;
/// // Position of an agent in a 20x20 m floor plan
/// let position = Vec2::new(10.0, 5.0);
///
/// // Access components directly
/// assert_eq!(position.x, 10.0);
/// assert_eq!(position.y, 5.0);
///
/// // Axis unit vectors
/// let east = Vec2::x_hat();
/// let north = Vec2::y_hat();
/// ```
#[derive(Default, Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec2 {
    /// X-component of the vector
    pub x: f64,
    /// Y-component of the vector
    pub y: f64,
}

impl Vec2 {
    /// Creates a new 2D vector with the given components.
    ///
    /// This is the primary constructor for `Vec2`. All components are stored
    /// as `f64` for maximum precision in mathematical operations.
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// let velocity = Vec2::new(1.5, -2.3);
    /// let force = Vec2::new(0.0, -9.81);
    /// ```
    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// Creates a zero vector (0, 0).
    ///
    /// The zero vector is the additive identity and represents no
    /// displacement, velocity, or force. It is the usual starting point for
    /// force accumulation.
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// let origin = Vec2::zero();
    /// assert_eq!(origin.x, 0.0);
    /// assert_eq!(origin.y, 0.0);
    ///
    /// let v = Vec2::new(1.0, 2.0);
    /// assert_eq!(v + Vec2::zero(), v);
    /// ```
    pub fn zero() -> Self {
        Vec2 { x: 0.0, y: 0.0 }
    }

    /// Returns the unit vector along the positive X-axis (1, 0).
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// let east = Vec2::x_hat();
    /// assert_eq!(east, Vec2::new(1.0, 0.0));
    /// assert!((east.norm() - 1.0).abs() < f64::EPSILON);
    /// ```
    pub fn x_hat() -> Self {
        Vec2::new(1.0, 0.0)
    }

    /// Returns the unit vector along the positive Y-axis (0, 1).
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// let north = Vec2::y_hat();
    /// assert_eq!(north, Vec2::new(0.0, 1.0));
    /// assert!((north.norm() - 1.0).abs() < f64::EPSILON);
    /// ```
    pub fn y_hat() -> Self {
        Vec2::new(0.0, 1.0)
    }

    /// Creates a unit vector from an angle measured counterclockwise from
    /// the positive X-axis.
    ///
    /// The discrete-velocity lattice uses this to build its eight compass
    /// directions `(cos 2πk/8, sin 2πk/8)`.
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// use std::f64::consts::PI;
    ///
    /// let east = Vec2::from_angle(0.0);
    /// assert!(east.approx_eq(&Vec2::x_hat(), 1e-12));
    ///
    /// let north = Vec2::from_angle(PI / 2.0);
    /// assert!(north.approx_eq(&Vec2::y_hat(), 1e-12));
    /// ```
    pub fn from_angle(angle: f64) -> Self {
        Vec2::new(angle.cos(), angle.sin())
    }
}
