use md_core::cell;
use md_core::error::{MdError, MdResult};
use md_core::store::TrajectoryStore;

/// Structural matching between two snapshots of the same atoms.
pub trait AtomMatcher {
    fn name(&self) -> &'static str;

    /// `order[i]` is the atom of `appended` that continues atom `i` of `base`.
    fn match_atoms(&self, base: &TrajectoryStore, appended: &TrajectoryStore) -> MdResult<Vec<usize>>;
}

/// Greedy nearest-image pairing of the base's last frame with the appended
/// segment's first frame, restricted to atoms of equal species.
#[derive(Clone, Debug, Default)]
pub struct NearestImageMatcher {
    /// Largest accepted displacement (bohr).
    pub max_distance: Option<f64>,
}

impl NearestImageMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = Some(max_distance);
        self
    }
}

impl AtomMatcher for NearestImageMatcher {
    fn name(&self) -> &'static str {
        "nearest_image"
    }

    fn match_atoms(&self, base: &TrajectoryStore, appended: &TrajectoryStore) -> MdResult<Vec<usize>> {
        base.check_identity(appended)?;
        if base.n_time() == 0 || appended.n_time() == 0 {
            return Err(MdError::Invalid(
                "atom matching needs at least one frame on each side".into(),
            ));
        }
        let last = base.n_time() - 1;
        let reference = base.positions_at(last)?;
        let target = appended.positions_at(0)?;
        let box_ = *base.cell_at(last)?;
        let inv = cell::inverse(&box_).ok();

        let species_a = base.species_of_atom();
        let species_b = appended.species_of_atom();
        let n = base.n_atoms();

        let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
        for a in 0..n {
            let pa = reference[a];
            for b in 0..n {
                if species_a[a] != species_b[b] {
                    continue;
                }
                let pb = target[b];
                let mut d = [pb[0] - pa[0], pb[1] - pa[1], pb[2] - pa[2]];
                if let Some(inv) = &inv {
                    d = cell::minimum_image(d, &box_, inv);
                }
                pairs.push((cell::norm2(d), a, b));
            }
        }
        pairs.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)).then(x.2.cmp(&y.2)));

        let mut order = vec![usize::MAX; n];
        let mut taken = vec![false; n];
        let mut assigned = 0usize;
        for (dist2, a, b) in pairs {
            if order[a] != usize::MAX || taken[b] {
                continue;
            }
            if let Some(max) = self.max_distance {
                let dist = dist2.sqrt();
                if dist > max {
                    return Err(MdError::Mismatch(format!(
                        "atom {a} is {dist:.4} bohr from its closest free partner {b} (limit {max})"
                    )));
                }
            }
            order[a] = b;
            taken[b] = true;
            assigned += 1;
            if assigned == n {
                break;
            }
        }
        if let Some(a) = order.iter().position(|&b| b == usize::MAX) {
            return Err(MdError::Mismatch(format!(
                "atom {a} (species {}) has no partner in the appended segment",
                species_a[a]
            )));
        }
        Ok(order)
    }
}

pub fn is_identity(order: &[usize]) -> bool {
    order.iter().enumerate().all(|(i, &j)| i == j)
}
