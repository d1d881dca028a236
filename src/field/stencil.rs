//! Finite-difference stencil operators over [`Field`].
//!
//! Gradients use central differences in the interior and one-sided
//! differences on the boundary, with unit grid spacing. The Laplacian and
//! divergence helpers use ghost cells fixed at zero, which is the boundary
//! treatment of the density solver.

use super::Field;

impl Field {
    /// Gradient of the field with unit cell spacing.
    ///
    /// Returns `(gx, gy)` where `gx` differentiates along columns and `gy`
    /// along rows. Interior cells use the central difference
    /// `(f[i+1] - f[i-1]) / 2`; boundary cells use the one-sided difference
    /// toward the interior.
    pub fn gradient(&self) -> (Field, Field) {
        let n = self.n();
        let mut gx = Field::zeros(n);
        let mut gy = Field::zeros(n);
        if n < 2 {
            return (gx, gy);
        }

        for y in 0..n {
            for x in 0..n {
                let dx = if x == 0 {
                    self.get(1, y) - self.get(0, y)
                } else if x == n - 1 {
                    self.get(n - 1, y) - self.get(n - 2, y)
                } else {
                    (self.get(x + 1, y) - self.get(x - 1, y)) / 2.0
                };
                gx.set(x, y, dx);

                let dy = if y == 0 {
                    self.get(x, 1) - self.get(x, 0)
                } else if y == n - 1 {
                    self.get(x, n - 1) - self.get(x, n - 2)
                } else {
                    (self.get(x, y + 1) - self.get(x, y - 1)) / 2.0
                };
                gy.set(x, y, dy);
            }
        }

        (gx, gy)
    }

    /// 5-point Laplacian scaled by `1 / dx²`, with zero ghost cells.
    ///
    /// Boundary cells keep a zero Laplacian, matching the interior-only
    /// update of the density scheme.
    pub fn laplacian(&self, dx: f64) -> Field {
        let n = self.n();
        let mut out = Field::zeros(n);
        if n < 3 {
            return out;
        }
        let inv_dx2 = 1.0 / (dx * dx);

        for y in 1..n - 1 {
            for x in 1..n - 1 {
                let center = self.get(x, y);
                let lap = self.get(x + 1, y) + self.get(x - 1, y) + self.get(x, y + 1)
                    + self.get(x, y - 1)
                    - 4.0 * center;
                out.set(x, y, lap * inv_dx2);
            }
        }

        out
    }

    /// 3×3 convolution with zero padding.
    ///
    /// `kernel[ky][kx]` is centered on the target cell; contributions from
    /// outside the grid are zero. The fire-spread kernel uses this.
    pub fn conv3x3(&self, kernel: &[[f64; 3]; 3]) -> Field {
        let n = self.n() as isize;
        let mut out = Field::zeros(self.n());

        for y in 0..n {
            for x in 0..n {
                let mut acc = 0.0;
                for (ky, row) in kernel.iter().enumerate() {
                    for (kx, &weight) in row.iter().enumerate() {
                        if weight == 0.0 {
                            continue;
                        }
                        let sx = x + kx as isize - 1;
                        let sy = y + ky as isize - 1;
                        if sx >= 0 && sx < n && sy >= 0 && sy < n {
                            acc += weight * self.get(sx as usize, sy as usize);
                        }
                    }
                }
                out.set(x as usize, y as usize, acc);
            }
        }

        out
    }

    /// Divergence of the flux `(vx·self, vy·self)` by centered differences
    /// over interior cells, scaled by `1 / (2·dx)`; boundary cells are zero.
    pub fn flux_divergence(&self, vx: &Field, vy: &Field, dx: f64) -> Field {
        let n = self.n();
        let mut out = Field::zeros(n);
        if n < 3 {
            return out;
        }
        let inv_2dx = 1.0 / (2.0 * dx);

        for y in 1..n - 1 {
            for x in 1..n - 1 {
                let fx_e = vx.get(x + 1, y) * self.get(x + 1, y);
                let fx_w = vx.get(x - 1, y) * self.get(x - 1, y);
                let fy_n = vy.get(x, y + 1) * self.get(x, y + 1);
                let fy_s = vy.get(x, y - 1) * self.get(x, y - 1);
                out.set(x, y, (fx_e - fx_w + fy_n - fy_s) * inv_2dx);
            }
        }

        out
    }
}
