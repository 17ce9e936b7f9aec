// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Server configuration, collecting the values the CLI (or a test) supplies.

use std::path::PathBuf;

/// Configuration for one printer instance.
///
/// Mirrors the fields `ippserver`'s command line accepts (spec.md §6); the
/// binary builds one of these from `clap` output, tests build one directly.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Printer name (positional argument; required).
    pub name: String,
    pub location: Option<String>,
    pub make: String,
    pub model: String,
    pub icon_path: Option<PathBuf>,
    /// Comma-separated `document-format-supported` list.
    pub formats: Vec<String>,
    pub duplex: bool,
    /// Pages-per-minute (monochrome, color). Color is `0` when unset.
    pub ppm: u32,
    pub ppm_color: u32,
    /// TCP port to bind; `0` asks the OS to pick one.
    pub port: u16,
    /// DNS-SD service type to register the printer under.
    pub regtype: String,
    pub spool_dir: PathBuf,
    pub verbose: u8,
}

impl ServerConfig {
    pub const DEFAULT_FORMATS: &'static str = "application/pdf,image/jpeg";
    pub const DEFAULT_REGTYPE: &'static str = "_ipp._tcp";
    pub const DEFAULT_ICON: &'static str = "printer.png";

    /// Build a configuration with the defaults spec.md §6/§10.4 specify,
    /// given only the required printer name.
    pub fn new(name: impl Into<String>) -> Self {
        let pid = std::process::id();
        Self {
            name: name.into(),
            location: None,
            make: "Unknown".to_string(),
            model: "Unknown".to_string(),
            icon_path: Some(PathBuf::from(Self::DEFAULT_ICON)),
            formats: Self::DEFAULT_FORMATS.split(',').map(str::to_string).collect(),
            duplex: false,
            ppm: 10,
            ppm_color: 0,
            port: 0,
            regtype: Self::DEFAULT_REGTYPE.to_string(),
            spool_dir: PathBuf::from(format!("/tmp/ippserver.{pid}")),
            verbose: 0,
        }
    }

    pub fn document_format_supported(&self) -> &[String] {
        &self.formats
    }

    /// `application/octet-stream` if present in the format list, else the
    /// first listed format (spec.md §11, ported from `create_printer`).
    pub fn document_format_default(&self) -> &str {
        self.formats
            .iter()
            .find(|f| f.as_str() == "application/octet-stream")
            .or_else(|| self.formats.first())
            .map(String::as_str)
            .unwrap_or("application/octet-stream")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = ServerConfig::new("test");
        assert_eq!(cfg.formats, vec!["application/pdf", "image/jpeg"]);
        assert_eq!(cfg.regtype, "_ipp._tcp");
        assert_eq!(cfg.port, 0);
        assert_eq!(cfg.ppm, 10);
        assert_eq!(cfg.ppm_color, 0);
        assert!(!cfg.duplex);
    }

    #[test]
    fn document_format_default_prefers_octet_stream() {
        let mut cfg = ServerConfig::new("test");
        cfg.formats = vec!["application/pdf".into(), "application/octet-stream".into()];
        assert_eq!(cfg.document_format_default(), "application/octet-stream");
    }

    #[test]
    fn document_format_default_falls_back_to_first() {
        let mut cfg = ServerConfig::new("test");
        cfg.formats = vec!["image/jpeg".into(), "image/png".into()];
        assert_eq!(cfg.document_format_default(), "image/jpeg");
    }
}
