#[test]
fn scalar_series_follow_time_unit() {
    let traj = drifting_traj(0, 4, 300.0, DT_ATU);
    let out = executor()
        .derived_series(&traj, 1, 4, Quantity::Temperature)
        .unwrap();
    assert_eq!(out.name, "temperature");
    assert_eq!(out.x_label, "Time [step]");
    assert_eq!(out.x, vec![1.0, 2.0, 3.0]);
    assert_eq!(out.y, vec![vec![300.0; 3]]);

    let cfg = AnalysisConfig {
        time_unit: Some(TimeUnit::Fs),
        output: Some("run1_T".into()),
        ..AnalysisConfig::default()
    };
    let out = Executor::new(&cfg)
        .unwrap()
        .derived_series(&traj, 0, 2, Quantity::Pressure)
        .unwrap();
    assert_eq!(out.name, "run1_T");
    assert_eq!(out.x_label, "Time [fs]");
    assert!((out.x[1] - units::atu_to_fs(DT_ATU)).abs() < 1e-12);
    assert_eq!(out.y_label, "Pressure [GPa]");
}

#[test]
fn every_scalar_quantity_is_windowed() {
    let traj = drifting_traj(0, 4, 300.0, DT_ATU);
    for (q, expected) in [
        (Quantity::KineticEnergy, 0.01),
        (Quantity::Entropy, 1e-4),
        (Quantity::Pressure, 1.5),
    ] {
        let out = executor().derived_series(&traj, 0, 4, q).unwrap();
        assert_eq!(out.y.len(), 1);
        assert_eq!(out.y[0], vec![expected; 4]);
    }
    assert!(executor()
        .derived_series(&traj, 0, 5, Quantity::Entropy)
        .is_err());
}

#[test]
fn vacf_series_uses_lag_axis() {
    let traj = drifting_traj(0, 4, 300.0, DT_ATU);
    let out = executor().derived_series(&traj, 0, 4, Quantity::Vacf).unwrap();
    assert_eq!(out.x_label, "Time [ps]");
    assert_eq!(out.labels, vec!["All", "H", "O"]);
    assert_eq!(out.y.len(), 3);
    assert_eq!(out.x.len(), out.y[0].len());
}

fn lagged_executor() -> Executor {
    let cfg = AnalysisConfig {
        max_lag: Some(100),
        ..AnalysisConfig::default()
    };
    Executor::new(&cfg).unwrap()
}

#[cfg(feature = "fft")]
#[test]
fn pdos_series_carries_harmonic_summary() {
    let traj = oscillator_traj(200, 25.0);
    let out = lagged_executor()
        .derived_series(&traj, 0, 200, Quantity::Pdos)
        .unwrap();
    assert_eq!(out.name, "PDOS");
    assert_eq!(out.x_label, "Frequency [meV]");
    let summary = out.harmonic.unwrap();
    let e0 = traj.mean_energy_per_atom(0, 200).unwrap() * units::HARTREE_EV;
    assert!((summary.e0 - e0).abs() < 1e-12);
    assert!(summary.functions.heat_capacity > 0.0);
    assert!(summary.functions.heat_capacity <= 3.0 + 1e-9);
    assert!((summary.total_free_energy() - e0 - summary.functions.free_energy).abs() < 1e-12);
}

#[cfg(feature = "fft")]
#[test]
fn thermo_series_sweeps_temperature() {
    let traj = oscillator_traj(200, 25.0);
    let out = lagged_executor()
        .derived_series(&traj, 0, 200, Quantity::Thermo)
        .unwrap();
    assert_eq!(out.name, "thermoFunctions");
    assert_eq!(out.x.len(), thermo::SWEEP_POINTS);
    assert!((out.x[thermo::SWEEP_POINTS - 1] - 600.0).abs() < 1e-9);
    assert_eq!(out.y.len(), 4);
    assert_eq!(out.labels[2], "C_v   [kB/atom]");
    assert!(out.y[2].iter().all(|c| (0.0..=3.0 + 1e-9).contains(c)));
}

#[cfg(feature = "fft")]
#[test]
fn thermo_plan_at_mean_temperature() {
    let traj = oscillator_traj(200, 25.0);
    let f = executor()
        .run(&ThermoPlan::new(0, 200).with_max_lag(Some(100)), &traj)
        .unwrap();
    // a 25 THz mode (103 meV) is mostly frozen at 300 K
    assert!(f.heat_capacity > 0.0 && f.heat_capacity < 3.0);
    assert!(f.internal_energy > 0.0);
    assert!(f.entropy > 0.0);
    assert!(f.free_energy < f.internal_energy);
}

#[test]
fn thermo_plan_reraises_missing_backend() {
    let traj = drifting_traj(0, 4, 300.0, DT_ATU);
    let exec = executor().with_backend(SpectralBackend::None);
    let err = exec.run(&ThermoPlan::new(0, 4), &traj).unwrap_err();
    assert!(err
        .to_string()
        .starts_with("unable to compute thermodynamic functions"));
    assert!(err.is_missing_capability());
}

#[cfg(feature = "fft")]
#[test]
fn thermo_plan_reraises_vacf_failures() {
    let plain = MdTrajectory::from_store(plain_store(0, 4));
    let err = executor().run(&ThermoPlan::new(0, 4), &plain).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("unable to compute thermodynamic functions"));
    assert!(text.contains("VACF calculation failed"));
}

#[test]
fn thermo_summary_reports_window_statistics() {
    let traj = drifting_traj(0, 4, 300.0, DT_ATU);
    let summary = ThermoSummary::from_window(&traj, 0, 4).unwrap();
    assert!((summary.volume.0 - BOX_BOHR.powi(3)).abs() < 1e-9);
    assert!(summary.volume.1.abs() < 1e-9);
    assert!((summary.temperature.0 - 300.0).abs() < 1e-12);
    let gpa = units::ha_per_bohr3_to_gpa();
    assert!((summary.stress[1].0 - 2e-5 * gpa).abs() < 1e-9);
    assert!(summary.total_energy.1 > 0.0);

    let mut buf = Vec::new();
    executor().thermo_summary(&traj, 0, 4, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains(" -- Thermodynamics information --"));
    assert!(text.contains(" Total energy [Ha]:"));
    assert!(text.contains(" Stress 6 [GPa]: "));
    assert_eq!(text.lines().count(), 12);
}

#[test]
fn executor_rejects_unknown_backend() {
    let cfg = AnalysisConfig {
        backend: Some("cufft".into()),
        ..AnalysisConfig::default()
    };
    let err = Executor::new(&cfg).err().unwrap();
    assert!(matches!(err, MdError::Unsupported(_)));
}

#[test]
fn spectral_series_failures_carry_context() {
    let traj = drifting_traj(0, 4, 300.0, DT_ATU);
    let exec = executor().with_backend(SpectralBackend::None);
    let err = exec.derived_series(&traj, 0, 4, Quantity::Pdos).unwrap_err();
    assert!(err.to_string().starts_with("PDOS calculation failed"));
    assert!(err.is_missing_capability());

    let err = exec.derived_series(&traj, 0, 4, Quantity::Thermo).unwrap_err();
    assert!(err
        .to_string()
        .starts_with("unable to compute thermodynamic functions"));
    assert!(err.is_missing_capability());
}

#[cfg(feature = "fft")]
#[test]
fn harmonic_failure_inside_pdos_series_is_annotated() {
    let traj = oscillator_traj(200, 25.0);
    let cfg = AnalysisConfig {
        max_lag: Some(100),
        omega_max: Some(1e-3),
        ..AnalysisConfig::default()
    };
    let err = Executor::new(&cfg)
        .unwrap()
        .derived_series(&traj, 0, 200, Quantity::Pdos)
        .unwrap_err();
    assert!(err
        .to_string()
        .starts_with("unable to compute thermodynamic functions"));
    assert!(matches!(err.root(), MdError::Invalid(_)));
}
