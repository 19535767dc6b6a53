//! Renders scraped samples in the Prometheus text exposition format.

use crate::metrics::{
    MetricDescriptor,
    MetricSample,
    MetricType,
};
use prometheus::{
    proto,
    Encoder as _,
    TextEncoder,
};
use std::sync::Arc;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Groups `samples` into one family per descriptor, in the order of
/// `descriptors`. Descriptors without samples are left out.
pub fn metric_families(descriptors: &[Arc<MetricDescriptor>], samples: &[MetricSample]) -> Vec<proto::MetricFamily> {
    descriptors
        .iter()
        .filter_map(|descriptor| {
            let metrics: Vec<proto::Metric> = samples
                .iter()
                .filter(|sample| sample.descriptor.name == descriptor.name)
                .map(to_metric)
                .collect();
            if metrics.is_empty() {
                return None;
            }

            let mut family = proto::MetricFamily::default();
            family.set_name(descriptor.name.clone());
            family.set_help(descriptor.help.clone());
            family.set_field_type(match descriptor.metric_type {
                MetricType::Gauge => proto::MetricType::GAUGE,
                MetricType::Counter => proto::MetricType::COUNTER,
            });
            family.set_metric(metrics.into());
            Some(family)
        })
        .collect()
}

pub fn encode(descriptors: &[Arc<MetricDescriptor>], samples: &[MetricSample]) -> prometheus::Result<String> {
    let families = metric_families(descriptors, samples);
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
}

fn to_metric(sample: &MetricSample) -> proto::Metric {
    let mut metric = proto::Metric::default();
    for (name, value) in &sample.labels {
        let mut pair = proto::LabelPair::default();
        pair.set_name(name.to_string());
        pair.set_value(value.clone());
        metric.mut_label().push(pair);
    }

    match sample.descriptor.metric_type {
        MetricType::Gauge => {
            let mut gauge = proto::Gauge::default();
            gauge.set_value(sample.value);
            metric.set_gauge(gauge);
        }
        MetricType::Counter => {
            let mut counter = proto::Counter::default();
            counter.set_value(sample.value);
            metric.set_counter(counter);
        }
    }

    if let Some(timestamp) = sample.timestamp {
        metric.set_timestamp_ms(timestamp.timestamp_millis());
    }
    metric
}
