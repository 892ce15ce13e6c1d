use cached::proc_macro::cached;
use opentelemetry::{KeyValue, metrics::Meter};

const METER_NAME: &str = "smart_meter";

//Counters are monotonic; a label set identifies one series per instrument
pub fn increment(name: &'static str, labels: &[(&str, &str)]) {
    counter(name).add(1, &to_attributes(labels))
}

pub fn set(name: &'static str, value: f64, labels: &[(&str, &str)]) {
    gauge(name).record(value, &to_attributes(labels))
}

fn to_attributes(labels: &[(&str, &str)]) -> Vec<KeyValue> {
    labels
        .iter()
        .map(|(k, v)| KeyValue::new(k.to_string(), v.to_string()))
        .collect()
}

fn meter() -> Meter {
    opentelemetry::global::meter(METER_NAME)
}

#[cached]
fn counter(name: &'static str) -> opentelemetry::metrics::Counter<u64> {
    meter().u64_counter(name).build()
}

#[cached]
fn gauge(name: &'static str) -> opentelemetry::metrics::Gauge<f64> {
    meter().f64_gauge(name).build()
}
