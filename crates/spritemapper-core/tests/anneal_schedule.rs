use spritemapper_core::anneal::{
    COOLING_RATE, INITIAL_TEMPERATURE, acceptance_probability, temperature,
};

#[test]
fn temperature_starts_hot_and_stops_at_the_budget() {
    assert_eq!(temperature(0, 100), INITIAL_TEMPERATURE);
    assert!((temperature(1, 100) - INITIAL_TEMPERATURE * COOLING_RATE).abs() < 1e-15);
    assert_eq!(temperature(100, 100), 0.0);
    assert_eq!(temperature(500, 100), 0.0);
    assert_eq!(temperature(0, 0), 0.0);
}

#[test]
fn temperature_is_non_increasing() {
    let budget = 5_000;
    for step in 0..budget {
        assert!(temperature(step, budget) >= temperature(step + 1, budget));
        assert!(temperature(step, budget) > 0.0);
    }
}

#[test]
fn temperature_does_not_depend_on_a_larger_budget() {
    for step in [0, 1, 17, 999] {
        assert_eq!(temperature(step, 1000), temperature(step, 9200));
    }
}

#[test]
fn improvements_are_always_accepted() {
    assert_eq!(acceptance_probability(100, 90, 0.0), 1.0);
    assert_eq!(acceptance_probability(100, 100, 0.0), 1.0);
    assert_eq!(acceptance_probability(100, 50, 0.3), 1.0);
}

#[test]
fn worse_moves_are_rejected_when_cold() {
    assert_eq!(acceptance_probability(100, 101, 0.0), 0.0);
    assert_eq!(acceptance_probability(0, 1, 1.0), 0.0);
}

#[test]
fn worse_moves_follow_the_boltzmann_factor() {
    let p = acceptance_probability(100, 110, 0.05);
    assert!((p - (-2.0f64).exp()).abs() < 1e-12);
    assert!(p > 0.0 && p < 1.0);

    // bigger regressions are less likely, hotter temperatures more likely
    assert!(acceptance_probability(100, 120, 0.05) < p);
    assert!(acceptance_probability(100, 110, 0.5) > p);
}
