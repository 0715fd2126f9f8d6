use nalgebra::Matrix3;

use crate::error::{MdError, MdResult};

/// Simulation cell, one lattice vector per row (bohr).
pub type Cell = [[f64; 3]; 3];

fn to_matrix(cell: &Cell) -> Matrix3<f64> {
    Matrix3::new(
        cell[0][0], cell[0][1], cell[0][2], cell[1][0], cell[1][1], cell[1][2], cell[2][0],
        cell[2][1], cell[2][2],
    )
}

fn from_matrix(m: &Matrix3<f64>) -> Cell {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}

pub fn determinant(cell: &Cell) -> f64 {
    to_matrix(cell).determinant()
}

pub fn volume(cell: &Cell) -> f64 {
    determinant(cell)
}

pub fn inverse(cell: &Cell) -> MdResult<Cell> {
    let inv = to_matrix(cell)
        .try_inverse()
        .ok_or_else(|| MdError::Mismatch("cell matrix not invertible".into()))?;
    Ok(from_matrix(&inv))
}

pub fn orthorhombic(lx: f64, ly: f64, lz: f64) -> Cell {
    [[lx, 0.0, 0.0], [0.0, ly, 0.0], [0.0, 0.0, lz]]
}

/// Shortest periodic image of the separation `d`; `inv` is `inverse(cell)`.
pub fn minimum_image(d: [f64; 3], cell: &Cell, inv: &Cell) -> [f64; 3] {
    let mut f = [0.0f64; 3];
    for (k, fk) in f.iter_mut().enumerate() {
        let raw = d[0] * inv[0][k] + d[1] * inv[1][k] + d[2] * inv[2][k];
        *fk = raw - raw.round();
    }
    [
        f[0] * cell[0][0] + f[1] * cell[1][0] + f[2] * cell[2][0],
        f[0] * cell[0][1] + f[1] * cell[1][1] + f[2] * cell[2][1],
        f[0] * cell[0][2] + f[1] * cell[1][2] + f[2] * cell[2][2],
    ]
}

pub fn norm2(v: [f64; 3]) -> f64 {
    v[0] * v[0] + v[1] * v[1] + v[2] * v[2]
}
