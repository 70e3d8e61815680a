mod util;
use util::*;

use halo_jacobi::algs::communicator::{CommTag, HaloTags};
use halo_jacobi::algs::halo::ExchangeMode;
use halo_jacobi::data::boundary::BoundaryRamp;

#[test]
fn blocking_and_nonblocking_agree_bitwise() {
    let blocking = assemble(&run_slabs(13, 4, 25, ExchangeMode::Blocking));
    let overlapped = assemble(&run_slabs(13, 4, 25, ExchangeMode::NonBlocking));
    assert_eq!(blocking, overlapped);
}

#[test]
fn worker_count_does_not_change_the_field() {
    let serial = assemble(&run_slabs(12, 1, 30, ExchangeMode::Blocking));
    for workers in [2, 3, 5, 12] {
        for mode in [ExchangeMode::Blocking, ExchangeMode::NonBlocking] {
            let split = assemble(&run_slabs(12, workers, 30, mode));
            assert_eq!(serial, split, "P={workers} {mode:?}");
        }
    }
}

#[test]
fn four_by_four_two_workers_one_sweep() {
    // worker 0 owns rows 1-2, worker 1 rows 3-4; increment = 100 / 5 = 20
    let d = 4;
    let w = d + 2;
    let init = initial_field(d);
    assert_eq!(BoundaryRamp::new(d).increment(), 20.0);
    assert_eq!(init[3 * w], 60.0); // left boundary, global row 3

    let locals = run_slabs(d, 2, 1, ExchangeMode::NonBlocking);
    assert_eq!((locals[0].slab().offset, locals[0].slab().rows), (0, 2));
    assert_eq!((locals[1].slab().offset, locals[1].slab().rows), (2, 2));

    let field = assemble(&locals);
    for i in 0..w {
        for j in 0..w {
            let boundary = i == 0 || j == 0 || i == w - 1 || j == w - 1;
            let want = if boundary {
                init[i * w + j]
            } else {
                0.25 * (init[(i - 1) * w + j]
                    + init[i * w + j + 1]
                    + init[(i + 1) * w + j]
                    + init[i * w + j - 1])
            };
            assert_eq!(field[i * w + j], want, "cell ({i}, {j})");
        }
    }
    // corner cell next to the top boundary and left ramp: 0.25 * (0 + 0.5 + 0.5 + 20)
    assert_eq!(field[w + 1], 5.25);
}

#[test]
fn zero_iterations_leave_the_initial_field() {
    for workers in [1, 3] {
        let field = assemble(&run_slabs(10, workers, 0, ExchangeMode::NonBlocking));
        assert_eq!(field, initial_field(10));
    }
}

#[test]
fn relaxation_stays_within_boundary_range() {
    // maximum principle: interior values stay between min and max boundary values
    let field = assemble(&run_slabs(9, 3, 200, ExchangeMode::NonBlocking));
    assert!(field.iter().all(|&v| (0.0..=100.0).contains(&v)));
}

#[test]
fn custom_halo_tags_give_the_same_field() {
    let tags = HaloTags::new(CommTag::new(7), CommTag::new(8));
    for mode in [ExchangeMode::Blocking, ExchangeMode::NonBlocking] {
        let tagged = assemble(&run_slabs_tagged(11, 3, 12, mode, tags));
        let default = assemble(&run_slabs(11, 3, 12, mode));
        assert_eq!(tagged, default, "{mode:?}");
    }
}
