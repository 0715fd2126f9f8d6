#[test]
fn self_merge_doubles_frames() {
    let mut traj = drifting_traj(0, 3, 300.0, DT_ATU);
    let original = traj.clone();
    let report = executor()
        .merge(&mut traj, &Segment::Md(original.clone()))
        .unwrap();
    assert_eq!(report.offset, 3);
    assert_eq!(report.appended_frames, 3);
    assert!(report.warnings.is_empty());
    assert!(report.permutation.is_none());
    assert_eq!(traj.n_time(), 6);
    traj.check_consistency().unwrap();

    let n = traj.n_atoms();
    assert_eq!(&traj.store.positions()[..3 * n], original.store.positions());
    assert_eq!(&traj.store.times()[..3], original.store.times());
    assert_eq!(&traj.md.temperature[..3], &original.md.temperature[..]);
    assert_eq!(
        &traj.md.velocities.as_ref().unwrap()[..3 * n],
        &original.md.velocities.as_ref().unwrap()[..]
    );
    assert_eq!(&traj.md.entropy[3..], &original.md.entropy[..]);
}

#[test]
fn reversed_atoms_are_reconciled() {
    let expected = drifting_traj(0, 6, 300.0, DT_ATU);
    let mut traj = drifting_traj(0, 3, 300.0, DT_ATU);
    let tail = reversed(&drifting_traj(3, 3, 300.0, DT_ATU));
    assert_eq!(tail.store.species_of_atom(), &[1, 1, 0, 0]);

    let report = executor().merge(&mut traj, &Segment::Md(tail)).unwrap();
    assert_eq!(report.permutation.as_deref(), Some(&[3usize, 2, 1, 0][..]));
    assert_eq!(traj.n_time(), 6);
    for itime in 0..6 {
        assert_eq!(
            traj.velocities_at(itime).unwrap(),
            expected.velocities_at(itime).unwrap()
        );
        assert_eq!(
            traj.store.positions_at(itime).unwrap(),
            expected.store.positions_at(itime).unwrap()
        );
    }
}

#[test]
fn reversed_atoms_without_reconciliation_are_rejected() {
    let mut traj = drifting_traj(0, 3, 300.0, DT_ATU);
    let tail = reversed(&drifting_traj(3, 3, 300.0, DT_ATU));
    let options = MergeOptions {
        reconcile_atoms: false,
        ..MergeOptions::default()
    };
    let err = merge_segment(&mut traj, &Segment::Md(tail), &options).unwrap_err();
    assert!(matches!(err, MdError::Mismatch(_)));
    assert_eq!(traj.n_time(), 3);
}

#[test]
fn plain_segment_zero_extends_md_series() {
    let mut traj = drifting_traj(0, 2, 300.0, DT_ATU);
    let report = executor()
        .merge(&mut traj, &Segment::Plain(plain_store(2, 3)))
        .unwrap();
    assert!(report.warnings.is_empty());
    assert_eq!(traj.n_time(), 5);
    traj.check_consistency().unwrap();
    assert_eq!(traj.temperature(4).unwrap(), 0.0);
    assert_eq!(traj.entropy(2).unwrap(), 0.0);
    assert_eq!(traj.velocities_at(3).unwrap(), &[[0.0; 3]; 4]);
    assert_eq!(traj.velocities_at(1).unwrap(), atom_velocities().as_slice());
}

#[test]
fn velocities_missing_on_the_base_are_backfilled() {
    let mut traj = MdTrajectory::from_store(plain_store(0, 2));
    assert!(!traj.has_velocities());
    executor()
        .merge(&mut traj, &Segment::Md(drifting_traj(2, 2, 300.0, DT_ATU)))
        .unwrap();
    assert_eq!(traj.velocities_at(0).unwrap(), &[[0.0; 3]; 4]);
    assert_eq!(traj.velocities_at(3).unwrap(), atom_velocities().as_slice());
    assert_eq!(traj.temperature(2).unwrap(), 300.0);
}

#[test]
fn inconsistent_segments_warn_but_merge() {
    let mut traj = drifting_traj(0, 3, 300.0, DT_ATU);
    let hot = drifting_traj(3, 3, 1000.0, 2.0 * DT_ATU);
    let report = executor().merge(&mut traj, &Segment::Md(hot)).unwrap();
    assert_eq!(traj.n_time(), 6);
    assert_eq!(report.warnings.len(), 2);
    match &report.warnings[0] {
        ConsistencyWarning::TimestepMismatch { base, appended } => {
            assert_eq!(*base, DT_ATU);
            assert_eq!(*appended, 2.0 * DT_ATU);
        }
        other => panic!("unexpected warning {other:?}"),
    }
    assert!(matches!(
        report.warnings[1],
        ConsistencyWarning::TemperatureMismatch { .. }
    ));
    assert!(report.warnings[1].to_string().contains("1000.00 K"));
}

#[test]
fn compressed_segment_raises_pressure_warning() {
    let mut traj = drifting_traj(0, 3, 300.0, DT_ATU);
    let mut squeezed = drifting_traj(3, 3, 300.0, DT_ATU);
    squeezed.md.pressure.iter_mut().for_each(|p| *p = 4.0);
    let report = executor().merge(&mut traj, &Segment::Md(squeezed)).unwrap();
    assert_eq!(traj.n_time(), 6);
    assert_eq!(report.warnings.len(), 1);
    match &report.warnings[0] {
        ConsistencyWarning::PressureMismatch { base, appended } => {
            assert!((base - 1.5).abs() < 1e-12);
            assert!((appended - 4.0).abs() < 1e-12);
        }
        other => panic!("unexpected warning {other:?}"),
    }
    assert_eq!(&traj.md.pressure[3..], &[4.0; 3]);
}

#[test]
fn foreign_species_leave_base_untouched() {
    let mut traj = drifting_traj(0, 3, 300.0, DT_ATU);
    let mut other = MdTrajectory::new(vec![0, 0, 1, 1], vec![1, 6]).unwrap();
    other
        .push_frame(frame(0.0, start_positions()), md_frame(None, 300.0))
        .unwrap();
    let err = executor().merge(&mut traj, &Segment::Md(other)).unwrap_err();
    assert!(matches!(err, MdError::Mismatch(_)));
    assert_eq!(traj.n_time(), 3);
}

struct FailingMatcher;

impl AtomMatcher for FailingMatcher {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn match_atoms(&self, _base: &TrajectoryStore, _appended: &TrajectoryStore) -> MdResult<Vec<usize>> {
        Err(MdError::Mismatch("no structural match".into()))
    }
}

#[test]
fn matcher_failure_is_annotated() {
    let mut traj = drifting_traj(0, 3, 300.0, DT_ATU);
    let tail = Segment::Md(drifting_traj(3, 3, 300.0, DT_ATU));
    let err = executor()
        .merge_with(&mut traj, &tail, FailingMatcher)
        .unwrap_err();
    assert!(err.to_string().starts_with("unable to map structures"));
    assert!(matches!(err.root(), MdError::Mismatch(_)));
    assert_eq!(traj.n_time(), 3);
    assert_eq!(traj.md.temperature.len(), 3);
}
