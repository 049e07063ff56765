//! Channel logo (picon) lookup.
//!
//! A picon build-source directory contains two `key=value` index files and a
//! `logos/` directory:
//!
//! - `snp.index` maps normalized service names to a logo base name
//! - `srp.index` maps service references to a logo base name
//! - `logos/{base}.{variant}.{svg|png}` holds the images
//!
//! The index is loaded once at startup and never refreshed.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use unicode_normalization::UnicodeNormalization;

const SNP_INDEX_FILE: &str = "snp.index";
const SRP_INDEX_FILE: &str = "srp.index";
const LOGOS_DIR: &str = "logos";

/// Errors raised while loading a picon index.
#[derive(Debug, Error)]
pub enum PiconError {
    #[error("Picon build-source path does not exist: {0}")]
    SourceNotFound(String),

    #[error("SNP index not found: {0}")]
    SnpIndexNotFound(String),

    #[error("SRP index not found: {0}")]
    SrpIndexNotFound(String),

    #[error("Failed to read picon index {path}: {message}")]
    Read { path: String, message: String },
}

/// Logo color variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PiconVariant {
    #[default]
    Default,
    Light,
    Dark,
    White,
    Black,
}

impl PiconVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            PiconVariant::Default => "default",
            PiconVariant::Light => "light",
            PiconVariant::Dark => "dark",
            PiconVariant::White => "white",
            PiconVariant::Black => "black",
        }
    }
}

impl fmt::Display for PiconVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for variant strings outside the recognized set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid variant \"{0}\". Must be one of: default, light, dark, white, black")]
pub struct InvalidVariant(pub String);

impl FromStr for PiconVariant {
    type Err = InvalidVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(PiconVariant::Default),
            "light" => Ok(PiconVariant::Light),
            "dark" => Ok(PiconVariant::Dark),
            "white" => Ok(PiconVariant::White),
            "black" => Ok(PiconVariant::Black),
            other => Err(InvalidVariant(other.to_string())),
        }
    }
}

/// A resolved logo file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiconFile {
    pub path: PathBuf,
    pub content_type: &'static str,
}

/// Index sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PiconStats {
    pub snp_entries: usize,
    pub srp_entries: usize,
}

/// Normalize a channel name the way picon service-name indexes are keyed.
///
/// NFKD-decompose, drop combining diacritics, spell out `&`, `+` and `*`,
/// lowercase, then keep only ASCII letters and digits.
pub fn normalize_snp(name: &str) -> String {
    let mut spelled = String::with_capacity(name.len());
    for c in name.nfkd() {
        match c {
            '\u{0300}'..='\u{036f}' => {}
            '&' => spelled.push_str("and"),
            '+' => spelled.push_str("plus"),
            '*' => spelled.push_str("star"),
            _ => spelled.push(c),
        }
    }

    spelled
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Parse `key=value` lines. Blank lines, lines without `=` and entries
/// with an empty key or value are skipped.
fn parse_index(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.split_once('='))
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Immutable picon lookup tables.
#[derive(Debug)]
pub struct PiconIndex {
    snp: HashMap<String, String>,
    srp: HashMap<String, String>,
    logos_dir: PathBuf,
}

impl PiconIndex {
    /// Load the indexes from a picon build-source directory.
    pub fn open(build_source_path: &Path) -> Result<Self, PiconError> {
        if !build_source_path.exists() {
            return Err(PiconError::SourceNotFound(
                build_source_path.display().to_string(),
            ));
        }

        let snp_path = build_source_path.join(SNP_INDEX_FILE);
        let srp_path = build_source_path.join(SRP_INDEX_FILE);

        if !snp_path.exists() {
            return Err(PiconError::SnpIndexNotFound(snp_path.display().to_string()));
        }
        if !srp_path.exists() {
            return Err(PiconError::SrpIndexNotFound(srp_path.display().to_string()));
        }

        let index = Self {
            snp: parse_index(&read_index(&snp_path)?),
            srp: parse_index(&read_index(&srp_path)?),
            logos_dir: build_source_path.join(LOGOS_DIR),
        };

        info!(
            snp_entries = index.snp.len(),
            srp_entries = index.srp.len(),
            "Loaded picon index from {}",
            build_source_path.display()
        );
        Ok(index)
    }

    /// Resolve a logo by display name (normalized before lookup).
    pub fn resolve_by_channel_name(&self, name: &str, variant: PiconVariant) -> Option<PiconFile> {
        let logo_base = self.snp.get(&normalize_snp(name))?;
        self.resolve_logo_file(logo_base, variant)
    }

    /// Resolve a logo by exact service reference.
    pub fn resolve_by_service_ref(
        &self,
        service_ref: &str,
        variant: PiconVariant,
    ) -> Option<PiconFile> {
        let logo_base = self.srp.get(service_ref)?;
        self.resolve_logo_file(logo_base, variant)
    }

    pub fn stats(&self) -> PiconStats {
        PiconStats {
            snp_entries: self.snp.len(),
            srp_entries: self.srp.len(),
        }
    }

    /// Try the requested variant, then `default`; SVG before PNG within each.
    fn resolve_logo_file(&self, logo_base: &str, variant: PiconVariant) -> Option<PiconFile> {
        let tiers: &[PiconVariant] = if variant == PiconVariant::Default {
            &[PiconVariant::Default]
        } else {
            &[variant, PiconVariant::Default]
        };

        for tier in tiers {
            for (extension, content_type) in [("svg", "image/svg+xml"), ("png", "image/png")] {
                let path = self
                    .logos_dir
                    .join(format!("{}.{}.{}", logo_base, tier, extension));
                if path.is_file() {
                    return Some(PiconFile { path, content_type });
                }
            }
        }

        None
    }
}

fn read_index(path: &Path) -> Result<String, PiconError> {
    std::fs::read_to_string(path).map_err(|e| PiconError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_snp() {
        assert_eq!(normalize_snp("Das Erste HD"), "daserstehd");
        assert_eq!(normalize_snp("Tom & Jerry"), "tomandjerry");
        assert_eq!(normalize_snp("RTL+"), "rtlplus");
        assert_eq!(normalize_snp("Star*TV"), "starstartv");
        assert_eq!(normalize_snp("Télé München"), "telemunchen");
        assert_eq!(normalize_snp("Sci-\u{FB01}"), "scifi");
        assert_eq!(normalize_snp("N-TV (HD)"), "ntvhd");
        assert_eq!(normalize_snp("3sat"), "3sat");
        assert_eq!(normalize_snp(""), "");
    }

    #[test]
    fn test_parse_index_skips_malformed_lines() {
        let map = parse_index("a=1\n\n  b = 2  \nnoequals\n=orphan\nempty=\nc=x=y\r\n");
        assert_eq!(map.len(), 3);
        assert_eq!(map["a"], "1");
        assert_eq!(map["b "], " 2");
        assert_eq!(map["c"], "x=y");
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("dark".parse::<PiconVariant>().unwrap(), PiconVariant::Dark);
        assert_eq!(
            "default".parse::<PiconVariant>().unwrap(),
            PiconVariant::Default
        );
        let err = "neon".parse::<PiconVariant>().unwrap_err();
        assert!(err.to_string().contains("Invalid variant"));
    }

    #[test]
    fn test_open_errors() {
        let temp_dir = TempDir::new().unwrap();

        let missing = temp_dir.path().join("missing");
        assert!(matches!(
            PiconIndex::open(&missing).unwrap_err(),
            PiconError::SourceNotFound(_)
        ));

        assert!(matches!(
            PiconIndex::open(temp_dir.path()).unwrap_err(),
            PiconError::SnpIndexNotFound(_)
        ));

        std::fs::write(temp_dir.path().join("snp.index"), "a=b\n").unwrap();
        assert!(matches!(
            PiconIndex::open(temp_dir.path()).unwrap_err(),
            PiconError::SrpIndexNotFound(_)
        ));
    }

    #[test]
    fn test_stats() {
        let temp_dir = TempDir::new().unwrap();
        fixtures::write_picon_source(temp_dir.path());

        let index = PiconIndex::open(temp_dir.path()).unwrap();
        assert_eq!(
            index.stats(),
            PiconStats {
                snp_entries: 6,
                srp_entries: 2
            }
        );
    }

    #[test]
    fn test_resolve_by_channel_name_prefers_svg() {
        let temp_dir = TempDir::new().unwrap();
        fixtures::write_picon_source(temp_dir.path());
        let index = PiconIndex::open(temp_dir.path()).unwrap();

        let file = index
            .resolve_by_channel_name("Das Erste HD", PiconVariant::Default)
            .unwrap();
        assert!(file.path.ends_with("logos/daserste.default.svg"));
        assert_eq!(file.content_type, "image/svg+xml");

        let file = index
            .resolve_by_channel_name("Both Formats", PiconVariant::Default)
            .unwrap();
        assert!(file.path.ends_with("logos/bothchannel.default.svg"));
    }

    #[test]
    fn test_resolve_png_only() {
        let temp_dir = TempDir::new().unwrap();
        fixtures::write_picon_source(temp_dir.path());
        let index = PiconIndex::open(temp_dir.path()).unwrap();

        let file = index
            .resolve_by_channel_name("PNG Only", PiconVariant::Default)
            .unwrap();
        assert!(file.path.ends_with("logos/pngchannel.default.png"));
        assert_eq!(file.content_type, "image/png");
    }

    #[test]
    fn test_variant_fallback() {
        let temp_dir = TempDir::new().unwrap();
        fixtures::write_picon_source(temp_dir.path());
        let index = PiconIndex::open(temp_dir.path()).unwrap();

        let dark = index
            .resolve_by_channel_name("With Variants", PiconVariant::Dark)
            .unwrap();
        assert!(dark.path.ends_with("logos/variantchannel.dark.svg"));

        let light = index
            .resolve_by_channel_name("With Variants", PiconVariant::Light)
            .unwrap();
        assert!(light.path.ends_with("logos/variantchannel.light.png"));

        let fallback = index
            .resolve_by_channel_name("ZDF HD", PiconVariant::White)
            .unwrap();
        assert!(fallback.path.ends_with("logos/zdf.default.svg"));
    }

    #[test]
    fn test_resolve_by_service_ref() {
        let temp_dir = TempDir::new().unwrap();
        fixtures::write_picon_source(temp_dir.path());
        let index = PiconIndex::open(temp_dir.path()).unwrap();

        let file = index
            .resolve_by_service_ref("1D5_B_1_130000", PiconVariant::Default)
            .unwrap();
        assert!(file.path.ends_with("logos/daserste.default.svg"));

        // Service references are matched exactly, without normalization.
        assert!(index
            .resolve_by_service_ref("1d5_b_1_130000", PiconVariant::Default)
            .is_none());
    }

    #[test]
    fn test_unresolved_lookups() {
        let temp_dir = TempDir::new().unwrap();
        fixtures::write_picon_source(temp_dir.path());
        let index = PiconIndex::open(temp_dir.path()).unwrap();

        assert!(index
            .resolve_by_channel_name("Unknown Channel", PiconVariant::Default)
            .is_none());
        assert!(index
            .resolve_by_service_ref("FFFF_0_0_0", PiconVariant::Default)
            .is_none());
        // Indexed, but no logo file on disk.
        assert!(index
            .resolve_by_channel_name("RTL HD", PiconVariant::Default)
            .is_none());
    }
}
