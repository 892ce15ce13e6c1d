pub mod meter;

use std::error::Error;

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{ExporterBuildError, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MonitoringConfig {
    pub service_name: String,
    pub app_name: String,
    pub logs: EnvFilterConfig,
    pub otlp: Option<OtlpConfig>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct EnvFilterConfig {
    pub default_level: String,
    #[serde(default)]
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct OtlpConfig {
    pub url: String,
}

impl TryInto<EnvFilter> for EnvFilterConfig {
    type Error = tracing_subscriber::filter::ParseError;

    fn try_into(self) -> Result<EnvFilter, Self::Error> {
        EnvFilter::builder()
            .with_default_directive(self.default_level.parse()?)
            .parse(self.filters.join(","))
    }
}

impl MonitoringConfig {
    pub fn init(&self) -> Result<(), Box<dyn Error>> {
        match &self.otlp {
            Some(otlp_config) => {
                let fmt_filter: EnvFilter = self.logs.clone().try_into()?;
                let fmt_layer = tracing_subscriber::fmt::layer().with_filter(fmt_filter);

                let resource = Resource::builder()
                    .with_attribute(KeyValue::new("service.name", self.service_name.clone()))
                    .with_attribute(KeyValue::new("app.name", self.app_name.clone()))
                    .build();

                let tracer_provider = init_traces(resource.clone(), &otlp_config.url)?;
                opentelemetry::global::set_tracer_provider(tracer_provider.clone());
                let tracer = tracer_provider.tracer(self.app_name.to_owned());
                let tracing_filter: EnvFilter = self.logs.clone().try_into()?;
                let tracing_layer = OpenTelemetryLayer::new(tracer).with_filter(tracing_filter);

                opentelemetry::global::set_meter_provider(init_metrics(resource, &otlp_config.url)?);

                tracing_subscriber::registry()
                    .with(tracing_layer)
                    .with(fmt_layer)
                    .try_init()?;
            }
            None => {
                let fmt_filter: EnvFilter = self.logs.clone().try_into()?;
                let fmt_layer = tracing_subscriber::fmt::layer().with_filter(fmt_filter);

                tracing_subscriber::registry().with(fmt_layer).try_init()?;
            }
        }

        Ok(())
    }
}

fn init_traces(resource: Resource, url: &str) -> Result<SdkTracerProvider, ExporterBuildError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(url)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build())
}

fn init_metrics(resource: Resource, url: &str) -> Result<SdkMeterProvider, ExporterBuildError> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(url)
        .build()?;
    let reader = PeriodicReader::builder(exporter)
        .with_interval(std::time::Duration::from_secs(15))
        .build();

    Ok(SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource)
        .build())
}
