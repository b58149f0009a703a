use prometheus_exporter::prometheus::{
    HistogramTimer, HistogramVec, IntCounterVec, IntGaugeVec, default_registry,
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_gauge_vec_with_registry,
};

// Provisioning each metrics
lazy_static::lazy_static! {
    pub static ref UNAGGREGATED_ATTESTATION_POOL_IDENTITIES: IntGaugeVec = create_int_gauge_vec(
        "beacon_unaggregated_attestation_pool_identities",
        "Number of distinct attestation data identities held by the unaggregated attestation pool",
        &[]
    );

    pub static ref UNAGGREGATED_ATTESTATION_POOL_ATTESTATIONS: IntGaugeVec = create_int_gauge_vec(
        "beacon_unaggregated_attestation_pool_attestations",
        "Number of single-validator attestations held by the unaggregated attestation pool",
        &[]
    );

    pub static ref UNAGGREGATED_ATTESTATION_POOL_EVENTS: IntCounterVec = create_int_counter_vec(
        "beacon_unaggregated_attestation_pool_events_total",
        "Outcomes of operations on the unaggregated attestation pool",
        &["event"]
    );

    pub static ref UNAGGREGATED_ATTESTATION_POOL_SWEEP_TIME: HistogramVec = create_histogram_vec(
        "beacon_unaggregated_attestation_pool_sweep_time",
        "Duration of the sections of a housekeeping sweep over the unaggregated attestation pool",
        &["section"]
    );
}

/// Create a new gauge metric
pub fn create_int_gauge_vec(name: &str, help: &str, label_names: &[&str]) -> IntGaugeVec {
    let registry = default_registry();
    register_int_gauge_vec_with_registry!(name, help, label_names, registry)
        .expect("failed to create int gauge vec")
}

/// Set the value of a gauge metric
pub fn set_int_gauge_vec(gauge_vec: &IntGaugeVec, value: i64, label_values: &[&str]) {
    gauge_vec.with_label_values(label_values).set(value);
}

/// Create a new counter metric
pub fn create_int_counter_vec(name: &str, help: &str, label_names: &[&str]) -> IntCounterVec {
    let registry = default_registry();
    register_int_counter_vec_with_registry!(name, help, label_names, registry)
        .expect("failed to create int counter vec")
}

/// Increase a counter metric by `value`
pub fn inc_int_counter_vec(counter_vec: &IntCounterVec, value: u64, label_values: &[&str]) {
    counter_vec.with_label_values(label_values).inc_by(value);
}

/// Create a new histogram metric
pub fn create_histogram_vec(name: &str, help: &str, label_names: &[&str]) -> HistogramVec {
    let registry = default_registry();
    register_histogram_vec_with_registry!(name, help, label_names, registry)
        .expect("failed to create histogram")
}

/// Start a timer for a histogram metric
pub fn start_timer_vec(histogram_vec: &HistogramVec, label_values: &[&str]) -> HistogramTimer {
    histogram_vec.with_label_values(label_values).start_timer()
}

/// Stop a timer for a histogram metric
pub fn stop_timer(timer: HistogramTimer) {
    timer.observe_duration()
}
