use chrono::{
    DateTime,
    Utc,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    Gauge,
    Counter,
}

/// Static description of a metric the exporter can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: String,
    pub metric_type: MetricType,
    pub labels: Vec<&'static str>,
}

impl MetricDescriptor {
    /// Builds `<namespace>_<subsystem>_<name>`, skipping empty parts.
    ///
    /// Names and labels are checked by `prometheus` the same way a
    /// registered collector would be.
    pub fn new(
        namespace: &str,
        subsystem: &str,
        name: &str,
        help: &str,
        metric_type: MetricType,
        labels: &[&'static str],
    ) -> prometheus::Result<Self> {
        let fq_name = [namespace, subsystem, name]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("_");
        prometheus::core::Desc::new(
            fq_name.clone(),
            help.to_string(),
            labels.iter().map(|label| label.to_string()).collect(),
            Default::default(),
        )?;
        Ok(Self {
            name: fq_name,
            help: help.to_string(),
            metric_type,
            labels: labels.to_vec(),
        })
    }
}

/// One labeled value of a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub descriptor: Arc<MetricDescriptor>,
    /// Label name/value pairs in the order of `descriptor.labels`.
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
    /// Explicit sample time; `None` means "time of the scrape".
    pub timestamp: Option<DateTime<Utc>>,
}

impl MetricSample {
    pub fn new(descriptor: Arc<MetricDescriptor>, value: f64) -> Self {
        Self {
            descriptor,
            labels: Vec::new(),
            value,
            timestamp: None,
        }
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(label, _)| *label == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}
