use crate::remote::{RemoteApi, RemoteError};
use crate::settings::MonitorSetting;
use chrono::Utc;
use dacroq_model::api_v1::{MetricSample, MonitorSnapshot};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};

/// Latest view of the remote API, shared between the pollers and handlers.
#[derive(Clone)]
pub struct Monitor {
    snapshot: Arc<RwLock<MonitorSnapshot>>,
    window: usize,
}

impl Monitor {
    pub fn new(window: usize) -> Self {
        Self {
            snapshot: Default::default(),
            window,
        }
    }

    pub async fn snapshot(&self) -> MonitorSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn record_health(&self, result: Result<Value, RemoteError>) {
        let mut snapshot = self.snapshot.write().await;
        let health = &mut snapshot.health;
        health.checked = Some(Utc::now());
        match result {
            Ok(detail) => {
                health.online = true;
                health.detail = Some(detail);
                health.last_error = None;
            }
            Err(e) => {
                log::warn!("Health check failed: {}", e);
                health.online = false;
                health.last_error = Some(e.to_string());
            }
        }
    }

    pub async fn record_metrics(&self, result: Result<Value, RemoteError>) {
        let mut snapshot = self.snapshot.write().await;
        match result {
            Ok(value) => {
                let sample = MetricSample {
                    time: Utc::now(),
                    value,
                };
                push_sample(&mut snapshot.metrics, sample, self.window);
                snapshot.metrics_error = None;
            }
            Err(e) => {
                log::warn!("Metrics poll failed: {}", e);
                snapshot.metrics_error = Some(e.to_string());
            }
        }
    }
}

/// Appends a sample, dropping the oldest so no more than `window` remain.
fn push_sample(samples: &mut Vec<MetricSample>, sample: MetricSample, window: usize) {
    samples.push(sample);
    if samples.len() > window {
        let excess = samples.len() - window;
        samples.drain(..excess);
    }
}

/// Runs the health and metrics pollers. Each ticks on its own interval and a
/// failed poll simply waits for the next tick.
pub async fn start(
    monitor: Monitor,
    remote: RemoteApi,
    setting: &MonitorSetting,
) -> anyhow::Result<()> {
    let health = async {
        let mut ticker = interval(setting.health_interval_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            monitor.record_health(remote.health().await).await;
        }
    };
    let metrics = async {
        let mut ticker = interval(setting.metrics_interval_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            monitor.record_metrics(remote.metrics().await).await;
        }
    };
    log::info!(
        "Monitoring remote API (health every {}s, metrics every {}s)",
        setting.health_interval,
        setting.metrics_interval
    );
    tokio::join!(health, metrics);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(n: i64) -> MetricSample {
        MetricSample {
            time: Utc::now(),
            value: json!({ "request_count": n }),
        }
    }

    #[test]
    fn window_never_exceeds_size() {
        let mut samples = Vec::new();
        for n in 0..10 {
            push_sample(&mut samples, sample(n), 3);
            assert!(samples.len() <= 3);
        }
        let kept: Vec<_> = samples.iter().map(|s| s.value["request_count"].clone()).collect();
        assert_eq!(kept, vec![json!(7), json!(8), json!(9)]);
    }

    #[tokio::test]
    async fn failed_health_check_marks_offline() {
        let monitor = Monitor::new(5);
        monitor.record_health(Ok(json!({"status": "healthy"}))).await;
        assert!(monitor.snapshot().await.health.online);
        monitor
            .record_health(Err(RemoteError::Status {
                status: 500,
                body: "unhealthy".into(),
            }))
            .await;
        let snapshot = monitor.snapshot().await;
        assert!(!snapshot.health.online);
        assert!(snapshot.health.last_error.is_some());
        assert_eq!(snapshot.health.detail, Some(json!({"status": "healthy"})));
    }

    #[tokio::test]
    async fn metrics_error_keeps_previous_samples() {
        let monitor = Monitor::new(5);
        monitor.record_metrics(Ok(json!({"request_count": 1}))).await;
        monitor
            .record_metrics(Err(RemoteError::Status {
                status: 503,
                body: String::new(),
            }))
            .await;
        let snapshot = monitor.snapshot().await;
        assert_eq!(snapshot.metrics.len(), 1);
        assert!(snapshot.metrics_error.is_some());
    }
}
