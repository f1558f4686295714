// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::net::IpAddr;
use tokio::net::lookup_host;
use url::{Host, Url};

/// 网址最大长度
pub const MAX_URL_LEN: usize = 2048;

/// 校验用户提交的目标网址
///
/// 只做语法层面的检查：http/https、存在主机名、不是 localhost 或私有地址字面量。
/// 返回规范化后的网址字符串。
pub fn validate_target_url(url_str: &str) -> anyhow::Result<String> {
    let trimmed = url_str.trim();
    if trimmed.is_empty() {
        return Err(anyhow::anyhow!("URL must not be empty"));
    }
    if trimmed.len() > MAX_URL_LEN {
        return Err(anyhow::anyhow!("URL exceeds {} characters", MAX_URL_LEN));
    }

    let url = Url::parse(trimmed)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow::anyhow!(
            "Unsupported URL scheme: {}",
            url.scheme()
        ));
    }

    match url.host() {
        None => return Err(anyhow::anyhow!("Missing host")),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            if domain == "localhost" || domain.ends_with(".localhost") {
                return Err(anyhow::anyhow!("SSRF protection: localhost is not allowed"));
            }
        }
        Some(Host::Ipv4(ip)) => reject_private(IpAddr::V4(ip))?,
        Some(Host::Ipv6(ip)) => reject_private(IpAddr::V6(ip))?,
    }

    Ok(url.to_string())
}

/// 验证 URL 解析后的地址是否安全 (防止 SSRF)
///
/// 检查 DNS 解析出的所有 IP 是否为私有地址或环回地址
pub async fn validate_resolved_host(url_str: &str) -> anyhow::Result<()> {
    let url = Url::parse(url_str)?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("Missing host"))?;

    if host == "localhost" {
        return Err(anyhow::anyhow!("SSRF protection: localhost is not allowed"));
    }

    let port = url.port_or_known_default().unwrap_or(80);
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let addrs = lookup_host((host, port)).await?;

    for addr in addrs {
        reject_private(addr.ip())?;
    }

    Ok(())
}

fn reject_private(ip: IpAddr) -> anyhow::Result<()> {
    if is_private_ip(ip) {
        return Err(anyhow::anyhow!(
            "SSRF protection: Private IP access is not allowed: {}",
            ip
        ));
    }
    Ok(())
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            ipv4.is_private()
                || ipv4.is_loopback()
                || ipv4.is_link_local()
                || ipv4.is_unspecified()
                || ipv4.is_broadcast()
                // 100.64.0.0/10 (CGNAT)
                || (octets[0] == 100 && (64..=127).contains(&octets[1]))
                // 224.0.0.0/4 (Multicast)
                || (224..=239).contains(&octets[0])
        }
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ip(IpAddr::V4(mapped));
            }
            let first = ipv6.segments()[0];
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // Unique Local Address (fc00::/7)
                || (first & 0xfe00) == 0xfc00
                // Link-local (fe80::/10)
                || (first & 0xffc0) == 0xfe80
                // Multicast (ff00::/8)
                || (first & 0xff00) == 0xff00
        }
    }
}
