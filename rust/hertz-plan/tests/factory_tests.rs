use std::sync::Arc;

use hertz_buffer::Buffer;
use hertz_engine::{Flags, R2rKind, ReferenceEngine, Sign};
use hertz_plan::{Planner, TransformFamily};
use hertz_testkit::engines::{CountingEngine, NullEngine};

#[test]
fn test_undefined_sign_rejected() {
    let planner = Planner::<f64>::default();
    let input = planner.allocate(8).unwrap();
    let output = planner.allocate(8).unwrap();
    for sign in [Sign(0), Sign(2), Sign(-2)] {
        let e = planner
            .dft(4, &input, &output, sign, Flags::ESTIMATE)
            .unwrap_err();
        assert!(e.is_invalid_argument());
    }
    assert!(
        planner
            .dft_allocated(4, Sign(0), Flags::ESTIMATE)
            .unwrap_err()
            .is_invalid_argument()
    );
    assert_eq!(input.outstanding_plans(), 0);
    assert_eq!(output.outstanding_plans(), 0);
}

#[test]
fn test_null_handle_leaves_no_binding() {
    let planner = Planner::<f64>::new(Arc::new(NullEngine::new()));
    let input = planner.allocate(8).unwrap();
    let output = planner.allocate(8).unwrap();
    let e = planner
        .dft(4, &input, &output, Sign::FORWARD, Flags::ESTIMATE)
        .unwrap_err();
    assert!(e.is_invalid_argument());
    assert_eq!(input.outstanding_plans(), 0);
    assert_eq!(output.outstanding_plans(), 0);

    let e = planner
        .r2r(4, &input, &output, &[R2rKind::Dht], Flags::ESTIMATE)
        .unwrap_err();
    assert!(e.is_invalid_argument());
    assert_eq!(input.outstanding_plans(), 0);
}

#[test]
fn test_null_handle_frees_allocated_buffers() {
    let engine = Arc::new(CountingEngine::new(NullEngine::new()));
    let stats = engine.allocation_stats();
    let planner = Planner::<f32>::new(engine.clone());

    assert!(
        planner
            .dft_allocated(8, Sign::FORWARD, Flags::ESTIMATE)
            .unwrap_err()
            .is_invalid_argument()
    );
    assert_eq!(stats.allocations(), 2);
    assert_eq!(stats.outstanding(), 0);
    assert_eq!(engine.plans_created(), 0);
}

#[test]
fn test_allocation_failure_frees_earlier_buffers() {
    // Room for one 16-element f64 buffer; the second allocation fails.
    let engine = Arc::new(CountingEngine::with_budget(ReferenceEngine::new(), 128));
    let stats = engine.allocation_stats();
    let planner = Planner::<f64>::new(engine.clone());

    let e = planner
        .dft_allocated(8, Sign::FORWARD, Flags::ESTIMATE)
        .unwrap_err();
    assert!(e.is_out_of_memory());
    assert_eq!(stats.allocations(), 1);
    assert_eq!(stats.failures(), 1);
    assert_eq!(stats.outstanding(), 0);
    assert_eq!(stats.outstanding_bytes(), 0);
    assert_eq!(engine.plans_created(), 0);

    // The in-place variant needs a single buffer and fits.
    let plan = planner
        .dft_in_place(8, Sign::FORWARD, Flags::ESTIMATE)
        .unwrap();
    assert_eq!(stats.outstanding(), 1);
    drop(plan);
    assert_eq!(stats.outstanding(), 0);
}

#[test]
fn test_wisdom_only_is_rejected_by_reference_engine() {
    let planner = Planner::<f64>::default();
    let e = planner
        .dft_in_place(4, Sign::FORWARD, Flags::WISDOM_ONLY)
        .unwrap_err();
    assert!(e.is_invalid_argument());
}

#[test]
fn test_invalid_shapes() {
    let planner = Planner::<f64>::default();
    let empty: &[usize] = &[];
    assert!(
        planner
            .dft_allocated(empty, Sign::FORWARD, Flags::ESTIMATE)
            .unwrap_err()
            .is_invalid_argument()
    );
    assert!(
        planner
            .dft_r2c_allocated([4, 0], Flags::ESTIMATE)
            .unwrap_err()
            .is_invalid_argument()
    );
    assert!(
        planner
            .dft_allocated([usize::MAX, 4], Sign::FORWARD, Flags::ESTIMATE)
            .unwrap_err()
            .is_overflow()
    );
}

#[test]
fn test_short_buffer_named() {
    let planner = Planner::<f64>::default();
    let input = planner.allocate(4).unwrap();
    let output = planner.allocate(5).unwrap();
    let e = planner
        .dft_r2c(4, &input, &output, Flags::ESTIMATE)
        .unwrap_err();
    assert!(e.is_invalid_argument());
    assert!(e.to_string().contains("output"), "{e}");

    let e = planner
        .dft_c2r(4, &output, &input, Flags::ESTIMATE)
        .unwrap_err();
    assert!(e.to_string().contains("input"), "{e}");
}

#[test]
fn test_r2r_lengths_and_kinds() {
    let planner = Planner::<f64>::default();
    let plan = planner
        .r2r_allocated(5, &[R2rKind::Redft00], Flags::ESTIMATE)
        .unwrap();
    assert_eq!(plan.min_length(0), Some(8));
    assert_eq!(plan.input().unwrap().len(), 8);

    let plan = planner
        .r2r_allocated([4, 3], &[R2rKind::Rodft00, R2rKind::Dht], Flags::ESTIMATE)
        .unwrap();
    assert_eq!(plan.min_length(1), Some(10 * 3));

    let e = planner
        .r2r_allocated([4, 3], &[R2rKind::Dht], Flags::ESTIMATE)
        .unwrap_err();
    assert!(e.is_invalid_argument());

    let short = planner.allocate(5).unwrap();
    let e = planner
        .r2r(5, &short, &short, &[R2rKind::Redft00], Flags::ESTIMATE)
        .unwrap_err();
    assert!(e.is_invalid_argument());
}

#[test]
fn test_in_place_detected_from_addresses() {
    let planner = Planner::<f64>::default();
    let a = planner.allocate(8).unwrap();
    let b = planner.allocate(8).unwrap();

    let plan = planner
        .dft(4, &a, &a, Sign::FORWARD, Flags::ESTIMATE)
        .unwrap();
    assert!(plan.is_in_place());
    assert!(!plan.owns_buffers());
    assert!(plan.input().is_none());
    assert_eq!(a.outstanding_plans(), 2);

    let plan = planner
        .dft(4, &a, &b, Sign::FORWARD, Flags::ESTIMATE)
        .unwrap();
    assert!(!plan.is_in_place());
}

#[test]
fn test_allocating_factories() {
    let engine = Arc::new(CountingEngine::default());
    let stats = engine.allocation_stats();
    let planner = Planner::<f64>::new(engine.clone());
    let n = 4;

    let cases: Vec<(TransformFamily, bool, usize)> = vec![
        (TransformFamily::Dft, false, 2),
        (TransformFamily::Dft, true, 1),
        (TransformFamily::SplitDft, false, 4),
        (TransformFamily::SplitDft, true, 2),
        (TransformFamily::DftR2c, false, 2),
        (TransformFamily::DftR2c, true, 1),
        (TransformFamily::SplitDftR2c, false, 3),
        (TransformFamily::SplitDftR2c, true, 2),
        (TransformFamily::DftC2r, false, 2),
        (TransformFamily::DftC2r, true, 1),
        (TransformFamily::SplitDftC2r, false, 3),
        (TransformFamily::SplitDftC2r, true, 2),
        (TransformFamily::R2r, false, 2),
        (TransformFamily::R2r, true, 1),
    ];
    for (family, in_place, buffers) in cases {
        let before = stats.allocations();
        let kinds = [R2rKind::Redft10];
        let flags = Flags::ESTIMATE;
        let plan = match (family, in_place) {
            (TransformFamily::Dft, false) => planner.dft_allocated(n, Sign::FORWARD, flags),
            (TransformFamily::Dft, true) => planner.dft_in_place(n, Sign::FORWARD, flags),
            (TransformFamily::SplitDft, false) => planner.split_dft_allocated(n, flags),
            (TransformFamily::SplitDft, true) => planner.split_dft_in_place(n, flags),
            (TransformFamily::DftR2c, false) => planner.dft_r2c_allocated(n, flags),
            (TransformFamily::DftR2c, true) => planner.dft_r2c_in_place(n, flags),
            (TransformFamily::SplitDftR2c, false) => planner.split_dft_r2c_allocated(n, flags),
            (TransformFamily::SplitDftR2c, true) => planner.split_dft_r2c_in_place(n, flags),
            (TransformFamily::DftC2r, false) => planner.dft_c2r_allocated(n, flags),
            (TransformFamily::DftC2r, true) => planner.dft_c2r_in_place(n, flags),
            (TransformFamily::SplitDftC2r, false) => planner.split_dft_c2r_allocated(n, flags),
            (TransformFamily::SplitDftC2r, true) => planner.split_dft_c2r_in_place(n, flags),
            (TransformFamily::R2r, false) => planner.r2r_allocated(n, &kinds, flags),
            (TransformFamily::R2r, true) => planner.r2r_in_place(n, &kinds, flags),
        }
        .unwrap();

        assert_eq!(plan.family(), family);
        assert_eq!(plan.is_in_place(), in_place, "{family}");
        assert!(plan.owns_buffers());
        assert_eq!(stats.allocations() - before, buffers, "{family} in_place={in_place}");
        for slot in 0..family.slot_count() {
            let buffer = plan.owned_buffer(slot).unwrap();
            assert!(buffer.len() >= plan.min_length(slot).unwrap());
            assert!(buffer.is_engine_allocated());
        }
        assert_eq!(engine.live_plans(), 1);
        plan.execute().unwrap();

        drop(plan);
        assert_eq!(engine.live_plans(), 0);
        assert_eq!(stats.outstanding(), 0, "{family} in_place={in_place}");
    }
}

#[test]
fn test_in_place_r2c_buffer_holds_both_sides() {
    let planner = Planner::<f64>::default();
    let plan = planner.dft_r2c_in_place(4, Flags::ESTIMATE).unwrap();
    let input = plan.input().unwrap();
    let output = plan.output().unwrap();
    assert!(input.same_address(output));
    assert_eq!(input.len(), 6);
}

#[test]
fn test_plan_disposal_releases_buffers() {
    let engine = Arc::new(CountingEngine::default());
    let stats = engine.allocation_stats();
    let planner = Planner::<f64>::new(engine.clone());

    let input = planner.allocate(8).unwrap();
    let output = planner.allocate(8).unwrap();
    let plan = planner
        .dft(4, &input, &output, Sign::FORWARD, Flags::ESTIMATE)
        .unwrap();
    assert_eq!(input.outstanding_plans(), 1);

    // Disposing a bound buffer defers its release to the plan's disposal.
    input.dispose();
    assert!(!input.is_released());
    assert_eq!(stats.outstanding(), 2);
    plan.execute().unwrap();

    plan.dispose();
    plan.dispose();
    assert!(input.is_released());
    assert_eq!(output.outstanding_plans(), 0);
    assert_eq!(stats.outstanding(), 1);
    assert_eq!(engine.live_plans(), 0);
}

#[test]
fn test_owned_buffers_disposed_with_plan() {
    let planner = Planner::<f32>::default();
    let plan = planner
        .dft_allocated([2, 3], Sign::BACKWARD, Flags::ESTIMATE)
        .unwrap();
    assert_eq!(plan.dims(), &[2, 3]);
    assert_eq!(plan.flags(), Flags::ESTIMATE);
    let input = plan.input().unwrap();
    let output = plan.output().unwrap();
    assert_eq!(input.len(), 12);
    assert_eq!(output.len(), 12);
    assert!(!input.same_address(output));

    plan.dispose();
    assert!(plan.input().unwrap().is_disposed());
    assert!(plan.output().unwrap().is_released());
}

#[test]
fn test_caller_buffer_outlives_plan_use() {
    let planner = Planner::<f64>::default();
    let data = Buffer::from_vec(vec![0.0f64; 8]).unwrap();
    let plan = planner
        .dft(4, &data, &data, Sign::FORWARD, Flags::ESTIMATE)
        .unwrap();
    drop(data);
    plan.execute().unwrap();
}
