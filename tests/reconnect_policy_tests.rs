use framelink::rpc::ReconnectPolicy;

#[test]
fn disabled_policy_never_schedules() {
    let mut policy = ReconnectPolicy::new(5000, 10);
    assert!(!policy.is_enabled());
    assert_eq!(policy.on_close(), None);
    assert_eq!(policy.attempts(), 0);
}

#[test]
fn delay_doubles_per_attempt() {
    let mut policy = ReconnectPolicy::new(5000, 10);
    policy.set_enabled(true);
    assert_eq!(policy.on_close(), Some(5000));
    assert_eq!(policy.on_close(), Some(10000));
    assert_eq!(policy.on_close(), Some(20000));
    assert_eq!(policy.attempts(), 3);
    assert_eq!(policy.current_delay(), 40000);
}

#[test]
fn attempt_budget_is_enforced() {
    let mut policy = ReconnectPolicy::new(100, 3);
    policy.set_enabled(true);
    assert_eq!(policy.on_close(), Some(100));
    assert_eq!(policy.on_close(), Some(200));
    assert_eq!(policy.on_close(), Some(400));
    assert_eq!(policy.on_close(), None);
    assert_eq!(policy.on_close(), None);
    assert_eq!(policy.attempts(), 3);
}

#[test]
fn open_resets_the_backoff() {
    let mut policy = ReconnectPolicy::new(5000, 10);
    policy.set_enabled(true);
    policy.on_close();
    policy.on_close();

    // This open concludes a reconnect cycle.
    assert!(policy.on_open());
    assert_eq!(policy.attempts(), 0);
    assert_eq!(policy.current_delay(), 5000);

    // The next episode starts from the base delay again.
    assert_eq!(policy.on_close(), Some(5000));
}

#[test]
fn first_open_is_not_a_reconnect() {
    let mut policy = ReconnectPolicy::new(5000, 10);
    policy.set_enabled(true);
    assert!(!policy.on_open());
}

#[test]
fn open_after_exhausted_budget_restores_it() {
    let mut policy = ReconnectPolicy::new(100, 1);
    policy.set_enabled(true);
    assert_eq!(policy.on_close(), Some(100));
    assert_eq!(policy.on_close(), None);

    // A manual connect succeeded; the budget is whole again.
    policy.on_open();
    assert_eq!(policy.on_close(), Some(100));
}
