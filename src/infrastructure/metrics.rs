// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::settings::MetricsSettings;

/// 初始化指标系统
///
/// 在配置的地址上启动 Prometheus 导出器并注册应用指标
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(
                "Invalid metrics listen address {}: {}",
                settings.listen_addr, e
            );
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!(
        "roast_analysis_total",
        "Total number of analysis runs by outcome"
    );
    describe_histogram!(
        "roast_analysis_duration_seconds",
        "Duration of analysis runs in seconds"
    );
    describe_counter!(
        "llm_request_attempts_total",
        "Total number of requests sent to the language model"
    );
    describe_counter!(
        "scrape_attempts_total",
        "Total number of page fetch attempts made by the scraper"
    );
    describe_counter!(
        "screenshot_capture_total",
        "Total number of screenshot captures by outcome"
    );
    describe_counter!("roasts_created_total", "Total number of roasts created");
    describe_counter!(
        "payments_completed_total",
        "Total number of purchases confirmed by the payment provider"
    );
}
