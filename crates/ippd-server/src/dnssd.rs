// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service advertisement (C7): a defensive `_printer._tcp` registration on
// port 0 (claims the name so legacy clients that only look for that service
// type don't treat us as absent), plus the real `_ipp._tcp` (or configured
// `regtype`) registration carrying the printer's capabilities in its TXT
// record (spec.md §4.7).

use ippd_core::error::IppdError;
use mdns_sd::{ServiceDaemon, ServiceInfo};
use tracing::{info, warn};

use crate::config::ServerConfig;

const DEFENSIVE_SERVICE_TYPE: &str = "_printer._tcp.local.";

pub struct Advertisement {
    daemon: ServiceDaemon,
    defensive_fullname: Option<String>,
    real_fullname: Option<String>,
}

fn build_txt(config: &ServerConfig, hostname: &str, port: u16) -> Vec<(String, String)> {
    let make_model = format!("{} {}", config.make, config.model);
    let formats = config.formats.join(",");
    vec![
        ("txtvers".to_string(), "1".to_string()),
        ("qtotal".to_string(), "1".to_string()),
        ("rp".to_string(), "ipp".to_string()),
        ("ty".to_string(), make_model.clone()),
        ("adminurl".to_string(), format!("http://{hostname}:{port}/")),
        ("note".to_string(), config.location.clone().unwrap_or_default()),
        ("priority".to_string(), "0".to_string()),
        ("product".to_string(), format!("({})", config.model)),
        ("pdl".to_string(), formats),
        ("Color".to_string(), if config.ppm_color > 0 { "T" } else { "F" }.to_string()),
        ("Duplex".to_string(), if config.duplex { "T" } else { "F" }.to_string()),
        ("usb_MFG".to_string(), config.make.clone()),
        ("usb_MDL".to_string(), config.model.clone()),
        ("air".to_string(), "none".to_string()),
    ]
}

impl Advertisement {
    /// Register both services. Failure is non-fatal: the printer remains
    /// reachable by direct IP, so registration failures are logged, not
    /// propagated (spec.md §7, resource errors are not fatal startup errors
    /// and mDNS is best-effort advertisement, not a precondition to serving).
    pub fn register(config: &ServerConfig, hostname: &str, port: u16) -> Option<Self> {
        match Self::try_register(config, hostname, port) {
            Ok(advertisement) => Some(advertisement),
            Err(e) => {
                warn!(error = %e, "failed to create mDNS daemon");
                None
            }
        }
    }

    fn try_register(config: &ServerConfig, hostname: &str, port: u16) -> Result<Self, IppdError> {
        let daemon = ServiceDaemon::new().map_err(|e| IppdError::Dnssd(e.to_string()))?;

        let host = format!("{hostname}.local.");

        let defensive_fullname = match ServiceInfo::new(
            DEFENSIVE_SERVICE_TYPE,
            &config.name,
            &host,
            "",
            0,
            &[][..],
        ) {
            Ok(info) => {
                let fullname = info.get_fullname().to_string();
                match daemon.register(info) {
                    Ok(_) => Some(fullname),
                    Err(e) => {
                        warn!(error = %IppdError::Dnssd(e.to_string()), "failed to register defensive _printer._tcp service");
                        None
                    }
                }
            }
            Err(e) => {
                warn!(error = %IppdError::Dnssd(e.to_string()), "failed to build defensive mDNS service info");
                None
            }
        };

        let real_service_type = format!("{}.local.", config.regtype.trim_end_matches('.'));
        let txt = build_txt(config, hostname, port);
        let txt_refs: Vec<(&str, &str)> = txt.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

        let real_fullname = match ServiceInfo::new(&real_service_type, &config.name, &host, "", port, &txt_refs[..]) {
            Ok(info) => {
                let fullname = info.get_fullname().to_string();
                match daemon.register(info) {
                    Ok(_) => {
                        info!(service_type = %real_service_type, name = %config.name, port, "mDNS service registered");
                        Some(fullname)
                    }
                    Err(e) => {
                        warn!(error = %IppdError::Dnssd(e.to_string()), "failed to register mDNS service");
                        None
                    }
                }
            }
            Err(e) => {
                warn!(error = %IppdError::Dnssd(e.to_string()), "failed to build mDNS service info");
                None
            }
        };

        Ok(Self { daemon, defensive_fullname, real_fullname })
    }

    pub fn unregister(self) {
        for fullname in [self.defensive_fullname, self.real_fullname].into_iter().flatten() {
            if let Err(e) = self.daemon.unregister(&fullname) {
                warn!(error = %e, name = %fullname, "failed to unregister mDNS service");
            }
        }
        if let Err(e) = self.daemon.shutdown() {
            warn!(error = %e, "failed to shut down mDNS daemon");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt_record_reflects_duplex_and_color_capability() {
        let mut config = ServerConfig::new("test");
        config.duplex = true;
        config.ppm_color = 10;
        let txt = build_txt(&config, "printer.local", 631);
        let get = |k: &str| txt.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("Duplex"), Some("T"));
        assert_eq!(get("Color"), Some("T"));
        assert_eq!(get("rp"), Some("ipp"));
    }

    #[test]
    fn txt_record_defaults_to_no_color_no_duplex() {
        let config = ServerConfig::new("test");
        let txt = build_txt(&config, "printer.local", 631);
        let get = |k: &str| txt.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("Duplex"), Some("F"));
        assert_eq!(get("Color"), Some("F"));
    }
}
