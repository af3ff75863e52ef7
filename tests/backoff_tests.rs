use std::time::Duration;

use staff_chat::settings::SETTINGS;
use staff_chat::{Backoff, ChatConfig, ChatError};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn test_backoff_doubles_until_cap() {
    let backoff = Backoff::new(ms(1_000), ms(10_000), 4);

    assert_eq!(backoff.delay(0), ms(1_000));
    assert_eq!(backoff.delay(1), ms(2_000));
    assert_eq!(backoff.delay(2), ms(4_000));
    assert_eq!(backoff.delay(3), ms(8_000));
    // 16s is clipped by max
    assert_eq!(backoff.delay(4), ms(10_000));
    assert_eq!(backoff.delay(5), ms(10_000));
    assert_eq!(backoff.delay(1_000), ms(10_000));
}

#[test]
fn test_backoff_attempt_cap_limits_exponent() {
    let backoff = Backoff::new(ms(100), ms(60_000), 2);

    assert_eq!(backoff.delay(2), ms(400));
    assert_eq!(backoff.delay(3), ms(400));
    assert_eq!(backoff.delay(u32::MAX), ms(400));
}

#[test]
fn test_backoff_is_non_decreasing() {
    let backoff = Backoff::new(ms(250), ms(5_000), 10);
    let delays: Vec<Duration> = (0..20).map(|n| backoff.delay(n)).collect();

    for pair in delays.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    assert!(delays.iter().all(|d| *d <= ms(5_000)));
}

#[test]
fn test_backoff_huge_cap_does_not_overflow() {
    let backoff = Backoff::new(Duration::from_secs(u64::MAX / 2), Duration::from_secs(30), 64);
    assert_eq!(backoff.delay(64), Duration::from_secs(30));
}

#[test]
fn test_backoff_cap_above_31_reaches_max() {
    let backoff = Backoff::new(ms(1), Duration::from_secs(10_000_000), 40);

    // 2^40 ms is well past the ceiling
    assert_eq!(backoff.delay(40), Duration::from_secs(10_000_000));
    assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(10_000_000));
    // Below the ceiling the formula is exact
    assert_eq!(backoff.delay(31), ms(1u64 << 31));
}

#[test]
fn test_backoff_tiny_base_large_exponent_is_exact() {
    let backoff = Backoff::new(Duration::from_nanos(1), Duration::from_secs(10_000), 50);

    // 2^40 ns is under the ceiling, 2^50 ns is not
    assert_eq!(backoff.delay(40), Duration::from_nanos(1u64 << 40));
    assert_eq!(backoff.delay(50), Duration::from_secs(10_000));
}

#[test]
fn test_backoff_zero_base_stays_zero() {
    let backoff = Backoff::new(Duration::ZERO, ms(500), 64);
    assert_eq!(backoff.delay(0), Duration::ZERO);
    assert_eq!(backoff.delay(50), Duration::ZERO);
}

#[test]
fn test_default_config_follows_settings() {
    let config = ChatConfig::default();

    assert_eq!(config.hosts, SETTINGS.hosts);
    assert_eq!(config.port, SETTINGS.port);
    assert_eq!(config.connect_timeout, SETTINGS.connect_timeout);
    assert_eq!(config.backoff.base, SETTINGS.base_backoff);
    assert_eq!(config.backoff.max, SETTINGS.max_backoff);
    assert_eq!(config.backoff.attempt_cap, SETTINGS.backoff_attempt_cap);
    assert_eq!(config.user_name, SETTINGS.fallback_name);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_builders_and_endpoints() {
    let config = ChatConfig::default()
        .with_hosts(["10.0.0.1", "localhost"])
        .with_port(7000)
        .with_fallback_name("Anonimoa")
        .with_user_name("   ");

    assert_eq!(config.endpoints(), vec!["10.0.0.1:7000", "localhost:7000"]);
    assert_eq!(config.user_name, "Anonimoa");
    assert_eq!(config.clean_user_name("  Ane  "), "Ane");
}

#[test]
fn test_config_validation() {
    let empty = ChatConfig::default().with_hosts(Vec::<String>::new());
    assert!(matches!(empty.validate(), Err(ChatError::NoCandidates)));

    let no_port = ChatConfig::default().with_port(0);
    assert!(matches!(no_port.validate(), Err(ChatError::InvalidConfig(_))));

    let no_timeout = ChatConfig::default().with_connect_timeout(Duration::ZERO);
    assert!(matches!(
        no_timeout.validate(),
        Err(ChatError::InvalidConfig(_))
    ));
}
