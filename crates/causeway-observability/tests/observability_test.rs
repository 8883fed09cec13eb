//! Tests for tracing setup and event helpers.

use causeway_core::config::ObservabilityConfig;
use causeway_core::FeedId;
use causeway_observability::tracing_setup::events;

#[test]
fn init_is_idempotent() {
    causeway_observability::init_tracing();
    // A second install must not panic even though a global subscriber exists.
    causeway_observability::init_tracing_from_config(&ObservabilityConfig::default());
}

#[test]
fn configured_output_is_plain_text_unless_json_is_requested() {
    let config = ObservabilityConfig::default();
    assert!(!config.json_logs);
    assert_eq!(config.log_level, "info");

    let json = ObservabilityConfig {
        json_logs: true,
        ..ObservabilityConfig::default()
    };
    // Either variant installs at most once; later calls are no-ops.
    causeway_observability::init_tracing_from_config(&config);
    causeway_observability::init_tracing_from_config(&json);
}

#[test]
fn events_emit_under_a_scoped_subscriber() {
    let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
    tracing::subscriber::with_default(subscriber, || {
        let feed = FeedId::derive("a");
        events::feed_admitted("m-1", &feed, 0);
        events::feed_rejected("m-1", &feed);
        events::block_emitted("m-1", &feed, 3, 2);
        events::malformed_block("m-1", &feed, 4);
        events::merger_stalled("m-1", 2, 1, 1_500);
        events::merger_closed("m-1", 10);
    });
}
