#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use md_core::cell;
use md_core::md::{MdFrame, MdTrajectory};
use md_core::store::{Frame, TrajectoryStore};
use md_core::units;
use tempfile::TempDir;

pub fn temp_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("md_engine_test_")
        .tempdir()
        .expect("create temp dir")
}

pub fn write_text(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

/// Step of 1 fs expressed in atu.
pub fn fs_step() -> f64 {
    1.0 / units::ATU_FS
}

/// A diatomic-like pair of species vibrating around fixed sites.
///
/// Atom `i` oscillates along x at `freqs_thz[species]` with amplitude
/// `amp` bohr; positions are sampled every fs starting at `first`.
pub fn vibrating_store(first: usize, n_frames: usize, freqs_thz: [f64; 2], amp: f64) -> TrajectoryStore {
    let sites = [
        [1.0, 1.0, 1.0],
        [5.0, 1.0, 1.0],
        [1.0, 5.0, 1.0],
        [5.0, 5.0, 1.0],
    ];
    let species = vec![0, 1, 0, 1];
    let mut store = TrajectoryStore::new(species.clone(), vec![6, 8]).expect("store");
    for step in first..first + n_frames {
        let t_ps = step as f64 * 1e-3;
        let positions = sites
            .iter()
            .zip(&species)
            .enumerate()
            .map(|(i, (site, &s))| {
                let phase = 2.0 * std::f64::consts::PI * freqs_thz[s] * t_ps + i as f64;
                [site[0] + amp * phase.sin(), site[1], site[2]]
            })
            .collect();
        store
            .push_frame(Frame {
                time: step as f64 * fs_step(),
                cell: cell::orthorhombic(8.0, 8.0, 8.0),
                stress: [0.0; 6],
                total_energy: -10.0,
                positions,
            })
            .expect("push frame");
    }
    store
}

pub fn empty_md_frame() -> MdFrame {
    MdFrame::default()
}

pub fn promote(store: TrajectoryStore) -> MdTrajectory {
    MdTrajectory::from_store(store)
}
