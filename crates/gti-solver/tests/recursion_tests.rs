use super::*;

#[test]
fn test_enter_and_leave_track_depth() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(4, 100);
    assert!(guard.enter(1).is_entered());
    assert!(guard.enter(2).is_entered());
    assert_eq!(guard.depth(), 2);
    assert!(guard.is_visiting(&1));
    guard.leave(2);
    guard.leave(1);
    assert_eq!(guard.depth(), 0);
    assert!(!guard.is_visiting(&1));
}

#[test]
fn test_reentering_a_key_is_a_cycle() {
    let mut guard: RecursionGuard<&str> = RecursionGuard::new(8, 100);
    assert!(guard.enter("a").is_entered());
    let again = guard.enter("a");
    assert!(again.is_cycle());
    assert!(!again.is_exceeded());
    assert_eq!(guard.depth(), 1);
    assert!(!guard.is_exceeded());
}

#[test]
fn test_depth_limit() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(2, 100);
    assert!(guard.enter(0).is_entered());
    assert!(guard.enter(1).is_entered());
    assert_eq!(guard.enter(2), RecursionResult::DepthExceeded);
    assert!(guard.is_exceeded());
}

#[test]
fn test_iteration_budget_spans_siblings() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(10, 3);
    for key in 0..3 {
        assert!(guard.enter(key).is_entered());
        guard.leave(key);
    }
    assert_eq!(guard.enter(9), RecursionResult::IterationExceeded);
    assert!(guard.is_exceeded());

    guard.reset();
    assert!(!guard.is_exceeded());
    assert!(guard.enter(9).is_entered());
}

#[test]
fn test_profiles_use_central_limits() {
    assert_eq!(
        RecursionProfile::SubtypeCheck.max_depth(),
        gti_common::limits::MAX_SUBTYPE_DEPTH
    );
    assert_eq!(
        RecursionProfile::Instantiation.max_depth(),
        gti_common::limits::MAX_INSTANTIATION_DEPTH
    );
    let custom = RecursionProfile::Custom {
        max_depth: 3,
        max_iterations: 7,
    };
    assert_eq!(custom.max_depth(), 3);
    assert_eq!(custom.max_iterations(), 7);
    let mut guard: RecursionGuard<u8> = RecursionGuard::with_profile(custom);
    for key in 0..3 {
        assert!(guard.enter(key).is_entered());
    }
    assert!(guard.enter(3).is_exceeded());
}
