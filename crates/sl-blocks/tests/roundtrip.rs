//! Envelope round trips through the registry dispatcher.

use proptest::prelude::*;
use sl_blocks::{
    ArxModel, ControlLoop, PidRegulator, SisoBlock, StaticClamp, deserialize,
};

fn drive(block: &mut dyn SisoBlock, inputs: &[f64]) {
    for &u in inputs {
        block.simulate(u);
    }
}

#[test]
fn nested_tree_round_trips_through_registry() {
    let mut inner = ControlLoop::new(true, 0.0);
    inner.push_back(Box::new(PidRegulator::new(0.4, 2.0, 0.1).unwrap()));
    inner.push_back(Box::new(
        ArxModel::with_seed(vec![-0.4], vec![0.6], 1, 0.1, 11).unwrap(),
    ));

    let mut outer = ControlLoop::new(false, 0.0);
    outer.push_back(Box::new(
        StaticClamp::new((-5.0, -2.0), (5.0, 2.0)).unwrap(),
    ));
    outer.push_back(Box::new(inner));
    drive(&mut outer, &[0.0, 1.0, 1.0, 0.5, -0.25, 1.0, 1.0]);

    let restored = deserialize(&outer.serialize()).unwrap();
    assert_eq!(restored.tag(), ControlLoop::TAG);
    assert!(outer.eq_block(restored.as_ref()));
}

#[test]
fn restored_tree_behaves_identically() {
    let mut l = ControlLoop::new(true, 0.0);
    l.push_back(Box::new(PidRegulator::new(0.4, 2.0, 0.0).unwrap()));
    l.push_back(Box::new(
        ArxModel::with_seed(vec![-0.4], vec![0.6], 1, 0.2, 123).unwrap(),
    ));
    drive(&mut l, &[0.0, 1.0, 1.0, 1.0, 1.0]);

    let mut restored = deserialize(&l.serialize()).unwrap();
    for _ in 0..20 {
        assert_eq!(l.simulate(1.0), restored.simulate(1.0));
    }
}

#[test]
fn every_truncation_of_a_tree_is_rejected() {
    let mut l = ControlLoop::new(true, 0.0);
    l.push_back(Box::new(PidRegulator::new(0.4, 2.0, 0.0).unwrap()));
    l.push_back(Box::new(
        ArxModel::with_seed(vec![-0.4], vec![0.6], 1, 0.0, 1).unwrap(),
    ));
    let dump = l.serialize();
    for cut in 0..dump.len() {
        assert!(
            deserialize(&dump[..cut]).is_err(),
            "truncation to {cut} bytes was accepted"
        );
    }
}

proptest! {
    #[test]
    fn pid_round_trips_with_arbitrary_state(
        k in 0.0..100.0f64,
        ti in 0.0..100.0f64,
        td in 0.0..100.0f64,
        errors in proptest::collection::vec(-10.0..10.0f64, 0..16),
    ) {
        let mut pid = PidRegulator::new(k, ti, td).unwrap();
        drive(&mut pid, &errors);
        let restored = deserialize(&pid.serialize()).unwrap();
        prop_assert!(pid.eq_block(restored.as_ref()));
    }

    #[test]
    fn clamp_round_trips(
        x1 in -100.0..100.0f64,
        y1 in -100.0..100.0f64,
        dx in 0.001..10.0f64,
        y2 in -100.0..100.0f64,
    ) {
        let clamp = StaticClamp::new((x1, y1), (x1 + dx, y2)).unwrap();
        let restored = deserialize(&clamp.serialize()).unwrap();
        prop_assert!(clamp.eq_block(restored.as_ref()));
    }

    #[test]
    fn arx_round_trips_with_arbitrary_history(
        a in proptest::collection::vec(-0.9..0.9f64, 1..5),
        b in proptest::collection::vec(-1.0..1.0f64, 1..5),
        delay in 1usize..6,
        stddev in 0.0..1.0f64,
        seed in any::<u64>(),
        inputs in proptest::collection::vec(-5.0..5.0f64, 0..24),
    ) {
        let mut m = ArxModel::with_seed(a, b, delay, stddev, seed).unwrap();
        drive(&mut m, &inputs);
        let restored = deserialize(&m.serialize()).unwrap();
        prop_assert!(m.eq_block(restored.as_ref()));
    }
}
