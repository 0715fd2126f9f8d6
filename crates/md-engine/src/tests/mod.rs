use super::*;
use md_core::cell;
use md_core::error::{MdError, MdResult};
use md_core::md::{MdFrame, MdTrajectory, Segment};
use md_core::store::{Frame, TrajectoryStore};
use md_core::units;

const DT_ATU: f64 = 40.0;
const BOX_BOHR: f64 = 12.0;

fn start_positions() -> Vec<[f64; 3]> {
    vec![
        [2.0, 2.0, 2.0],
        [6.0, 2.0, 2.0],
        [2.0, 6.0, 2.0],
        [6.0, 6.0, 6.0],
    ]
}

fn atom_velocities() -> Vec<[f64; 3]> {
    vec![
        [1e-3, 0.0, 0.0],
        [0.0, -2e-3, 0.0],
        [0.0, 0.0, 5e-4],
        [1e-3, 1e-3, -1e-3],
    ]
}

fn positions_at(step: usize, dt: f64) -> Vec<[f64; 3]> {
    start_positions()
        .iter()
        .zip(atom_velocities())
        .map(|(p, v)| {
            let t = step as f64 * dt;
            [p[0] + v[0] * t, p[1] + v[1] * t, p[2] + v[2] * t]
        })
        .collect()
}

fn frame(time: f64, positions: Vec<[f64; 3]>) -> Frame {
    Frame {
        time,
        cell: cell::orthorhombic(BOX_BOHR, BOX_BOHR, BOX_BOHR),
        stress: [1e-5, 2e-5, 3e-5, 0.0, 0.0, 0.0],
        total_energy: -4.0 - 1e-6 * time,
        positions,
    }
}

fn md_frame(velocities: Option<Vec<[f64; 3]>>, temperature: f64) -> MdFrame {
    MdFrame {
        velocities,
        kinetic_energy: 0.01,
        temperature,
        pressure: 1.5,
        entropy: 1e-4,
    }
}

/// Two H and two O atoms moving at constant velocity, frames `first..first + n`.
fn drifting_traj(first: usize, n_frames: usize, temperature: f64, dt: f64) -> MdTrajectory {
    let mut traj = MdTrajectory::new(vec![0, 0, 1, 1], vec![1, 8]).unwrap();
    traj.reserve(n_frames);
    for step in first..first + n_frames {
        traj.push_frame(
            frame(step as f64 * dt, positions_at(step, dt)),
            md_frame(Some(atom_velocities()), temperature),
        )
        .unwrap();
    }
    traj
}

/// Same frames with the atom order reversed.
fn reversed(traj: &MdTrajectory) -> MdTrajectory {
    let mut species = traj.store.species_of_atom().to_vec();
    species.reverse();
    let mut out = MdTrajectory::new(species, traj.store.atomic_numbers().to_vec()).unwrap();
    for itime in 0..traj.n_time() {
        let mut positions = traj.store.positions_at(itime).unwrap().to_vec();
        positions.reverse();
        let mut velocities = traj.velocities_at(itime).unwrap().to_vec();
        velocities.reverse();
        let mut f = frame(traj.store.times()[itime], positions);
        f.total_energy = traj.store.total_energies()[itime];
        out.push_frame(f, md_frame(Some(velocities), traj.temperature(itime).unwrap()))
            .unwrap();
    }
    out
}

fn plain_store(first: usize, n_frames: usize) -> TrajectoryStore {
    let mut store = TrajectoryStore::new(vec![0, 0, 1, 1], vec![1, 8]).unwrap();
    for step in first..first + n_frames {
        store
            .push_frame(frame(step as f64 * DT_ATU, positions_at(step, DT_ATU)))
            .unwrap();
    }
    store
}

/// Two Si atoms whose velocities oscillate at `freq_thz`, sampled every fs.
fn oscillator_traj(n_frames: usize, freq_thz: f64) -> MdTrajectory {
    let dt_atu = 1.0 / units::ATU_FS;
    let mut traj = MdTrajectory::new(vec![0, 0], vec![14]).unwrap();
    for step in 0..n_frames {
        let t_ps = step as f64 * 1e-3;
        let phase = 2.0 * std::f64::consts::PI * freq_thz * t_ps;
        let v = 1e-4 * phase.cos();
        traj.push_frame(
            frame(step as f64 * dt_atu, vec![[1.0, 1.0, 1.0], [5.0, 5.0, 5.0]]),
            md_frame(Some(vec![[v, 0.0, 0.0], [0.0, -v, 0.0]]), 300.0),
        )
        .unwrap();
    }
    traj
}

fn executor() -> Executor {
    Executor::new(&AnalysisConfig::default()).unwrap()
}

include!("part1.rs");
include!("part2.rs");
include!("part3.rs");
include!("part4.rs");
