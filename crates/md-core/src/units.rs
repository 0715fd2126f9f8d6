//! Physical constants and unit conversions.
//!
//! Trajectories are stored in Hartree atomic units; the derived quantities
//! are reported in K, GPa, eV, meV, nm and ps.

/// Hartree energy (J).
pub const HARTREE_J: f64 = 4.359_744_722_207_1e-18;
/// Boltzmann constant (J/K).
pub const BOLTZMANN_J: f64 = 1.380_649e-23;
/// Electronvolt (J).
pub const ELECTRONVOLT_J: f64 = 1.602_176_634e-19;
/// Planck constant (J s).
pub const PLANCK_J_S: f64 = 6.626_070_15e-34;
/// Bohr radius (Angstrom).
pub const BOHR_ANGSTROM: f64 = 0.529_177_210_903;
/// Atomic time unit (fs).
pub const ATU_FS: f64 = 2.418_884_326_585_7e-2;
/// Hartree (eV).
pub const HARTREE_EV: f64 = 27.211_386_245_988;
/// Energy of a 1 THz photon (Ha).
pub const THZ_HARTREE: f64 = PLANCK_J_S * 1.0e12 / HARTREE_J;
/// Unified atomic mass unit (electron masses).
pub const AMU_EMASS: f64 = 1_822.888_486_209;

/// Fallback spacing between frames when fewer than two are recorded (atu).
pub const DEFAULT_DTION_ATU: f64 = 100.0;

/// Ha/bohr^3 -> GPa.
pub fn ha_per_bohr3_to_gpa() -> f64 {
    HARTREE_J / (BOHR_ANGSTROM * BOHR_ANGSTROM * BOHR_ANGSTROM) * 1.0e21
}

/// bohr^2/atu^2 -> nm^2/ps^2.
pub fn velocity_sq_to_nm2_ps2() -> f64 {
    let length = BOHR_ANGSTROM * 1.0e-1;
    let time = ATU_FS * 1.0e-3;
    length * length / (time * time)
}

pub fn atu_to_ps(t: f64) -> f64 {
    t * ATU_FS * 1.0e-3
}

pub fn atu_to_fs(t: f64) -> f64 {
    t * ATU_FS
}

/// kB*T in eV.
pub fn kbt_ev(temperature: f64) -> f64 {
    BOLTZMANN_J * temperature / ELECTRONVOLT_J
}

/// Energy of a vibration of `freq_thz` expressed in meV.
pub fn thz_to_mev(freq_thz: f64) -> f64 {
    THZ_HARTREE * HARTREE_EV * 1.0e3 * freq_thz
}
