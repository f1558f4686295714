// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::settings::LoggingSettings;

/// 初始化日志订阅器
///
/// 默认过滤级别为 `info,web3roast=debug`，可通过 `RUST_LOG` 覆盖
pub fn init_telemetry(settings: &LoggingSettings) {
    let json_layer = settings
        .json
        .then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!settings.json).then(|| tracing_subscriber::fmt::layer());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,web3roast=debug,tower_http=info".into()),
        )
        .with(json_layer)
        .with(text_layer)
        .init();
}
