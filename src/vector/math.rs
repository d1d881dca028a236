//! Vector math operations for Vec2
//! Provides methods for normalization, dot products, distances, perpendiculars,
//! and norm clamping.

use super::Vec2;

impl Vec2 {
    /// Calculates the squared magnitude (length) of the vector.
    ///
    /// This is more efficient than `norm()` as it avoids the square root
    /// operation. Use this when you only need to compare magnitudes.
    ///
    /// The squared norm is calculated as: x² + y²
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// let v = Vec2::new(3.0, 4.0);
    /// assert_eq!(v.norm_squared(), 25.0);
    ///
    /// // Useful for distance comparisons without sqrt
    /// if v.norm_squared() < 100.0 {
    ///     println!("Vector is close to origin");
    /// }
    /// ```
    #[inline]
    pub fn norm_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Calculates the magnitude (length) of the vector.
    ///
    /// Returns the Euclidean norm: √(x² + y²)
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// let v = Vec2::new(3.0, 4.0);
    /// assert_eq!(v.norm(), 5.0);
    /// ```
    #[inline]
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Returns a unit vector in the same direction as this vector.
    ///
    /// If the vector has zero or near-zero magnitude (within floating-point
    /// epsilon), returns the zero vector to avoid division by zero. The force
    /// terms rely on this: two coincident agents exert no directed force on
    /// each other.
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// let v = Vec2::new(3.0, 4.0);
    /// let normalized = v.normalize();
    /// assert!((normalized.norm() - 1.0).abs() < f64::EPSILON);
    ///
    /// // Zero vector normalization
    /// assert_eq!(Vec2::zero().normalize(), Vec2::zero());
    /// ```
    pub fn normalize(&self) -> Self {
        let norm_sq = self.norm_squared();
        if norm_sq > f64::EPSILON * f64::EPSILON {
            let inv_norm = norm_sq.sqrt().recip();
            Vec2 {
                x: self.x * inv_norm,
                y: self.y * inv_norm,
            }
        } else {
            Vec2::zero()
        }
    }

    /// Calculates the dot product (scalar product) with another vector.
    ///
    /// The dot product measures how much two vectors point in the same
    /// direction: a·b = ax*bx + ay*by
    ///
    /// # Properties
    /// - Positive when vectors point in similar directions
    /// - Zero when vectors are perpendicular
    /// - Negative when vectors point in opposite directions
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// let a = Vec2::new(1.0, 2.0);
    /// let b = Vec2::new(4.0, 5.0);
    /// assert_eq!(a.dot(&b), 14.0);
    ///
    /// // Perpendicular vectors have dot product of 0
    /// assert_eq!(Vec2::x_hat().dot(&Vec2::y_hat()), 0.0);
    /// ```
    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Returns the counterclockwise perpendicular of this vector.
    ///
    /// The perpendicular of (x, y) is (-y, x); it has the same magnitude and
    /// is rotated 90° counterclockwise. Used for sliding directions along
    /// wall segments.
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// assert_eq!(Vec2::x_hat().perp(), Vec2::y_hat());
    /// let v = Vec2::new(2.0, 3.0);
    /// assert_eq!(v.dot(&v.perp()), 0.0);
    /// ```
    #[inline]
    pub fn perp(&self) -> Self {
        Vec2 {
            x: -self.y,
            y: self.x,
        }
    }

    /// Calculates the Euclidean distance to another point.
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// let a = Vec2::new(0.0, 0.0);
    /// let b = Vec2::new(3.0, 4.0);
    /// assert_eq!(a.distance_to(&b), 5.0);
    /// ```
    #[inline]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (*self - *other).norm()
    }

    /// Clamps the magnitude of this vector to at most `max_norm`, preserving
    /// direction.
    ///
    /// Vectors shorter than the cap are returned unchanged. The social-force
    /// integrator applies this as the panic-scaled speed cap
    /// `v_max = v_des · (1 + 0.5·panic)`.
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// let v = Vec2::new(3.0, 4.0); // norm 5
    /// let capped = v.clamp_norm(2.5);
    /// assert!((capped.norm() - 2.5).abs() < 1e-12);
    ///
    /// let slow = Vec2::new(0.1, 0.0);
    /// assert_eq!(slow.clamp_norm(2.5), slow);
    /// ```
    pub fn clamp_norm(&self, max_norm: f64) -> Self {
        let norm = self.norm();
        if norm > max_norm && norm > 0.0 {
            *self * (max_norm / norm)
        } else {
            *self
        }
    }

    /// Checks if this vector is approximately equal to another within epsilon
    /// tolerance.
    ///
    /// Due to floating-point precision limitations, exact equality is rarely
    /// appropriate for vector comparisons. This method compares each
    /// component individually within the specified tolerance.
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// let v1 = Vec2::new(1.0, 2.0);
    /// let v2 = Vec2::new(1.0000001, 2.0000001);
    ///
    /// assert!(v1.approx_eq(&v2, 1e-6));
    /// assert!(!v1.approx_eq(&v2, 1e-8));
    /// ```
    #[inline]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        let epsilon = epsilon.max(f64::EPSILON); // Ensure non-zero epsilon
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }

    /// Projects the point `self` onto the segment `[a, b]`, clamped to the
    /// segment endpoints, and returns the closest point.
    ///
    /// Degenerate segments (`a == b`) project onto `a`. Wall repulsion uses
    /// this to find the nearest wall point for each agent.
    ///
    /// # Examples
    /// ```
    /// # use evacuation_lib::vector::Vec2;
    /// let a = Vec2::new(0.0, 0.0);
    /// let b = Vec2::new(10.0, 0.0);
    ///
    /// // Interior projection
    /// let p = Vec2::new(3.0, 2.0);
    /// assert_eq!(p.project_onto_segment(&a, &b), Vec2::new(3.0, 0.0));
    ///
    /// // Clamped to an endpoint
    /// let q = Vec2::new(-4.0, 1.0);
    /// assert_eq!(q.project_onto_segment(&a, &b), a);
    /// ```
    pub fn project_onto_segment(&self, a: &Self, b: &Self) -> Self {
        let seg = *b - *a;
        let len_sq = seg.norm_squared();
        if len_sq < f64::EPSILON * f64::EPSILON {
            return *a;
        }
        let t = ((*self - *a).dot(&seg) / len_sq).clamp(0.0, 1.0);
        *a + seg * t
    }
}
