// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Run settings
//!
//! Settings are read from a YAML or TOML file and then overridden by
//! command-line flags. Every field has a default, so an empty file (or no
//! file at all) yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{Read2vecError, Read2vecResult};

/// Name of the per-project settings file looked up under the input root
pub const PROJECT_SETTINGS_FILE: &str = "read2vec.yaml";

/// Default number of lines an artifact needs to count as complete
pub const DEFAULT_MIN_LINES: usize = 5;

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Lines an artifact must contain to be considered complete
    pub min_lines: usize,

    /// Directory names under the input root
    pub layout: Layout,

    /// Panel intersection settings
    pub intersect: IntersectSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_lines: DEFAULT_MIN_LINES,
            layout: Layout::default(),
            intersect: IntersectSettings::default(),
        }
    }
}

/// Directory layout relative to the input root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Subdirectory of the sample directory holding the gMSV report
    pub gmsv_subdir: String,
    /// Shared report directory, searched when the sample copy is absent
    pub report_dir: String,
    /// Output directory for every produced artifact
    pub output_dir: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            gmsv_subdir: "07.gMSV".into(),
            report_dir: "07.cpg_report".into(),
            output_dir: "08.read2vec".into(),
        }
    }
}

/// Which implementation intersects sample intervals with the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntersectTool {
    /// External `bedtools intersect`
    Bedtools,
    /// In-process overlap test with the same semantics
    Builtin,
}

impl std::fmt::Display for IntersectTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bedtools => write!(f, "bedtools"),
            Self::Builtin => write!(f, "builtin"),
        }
    }
}

impl std::str::FromStr for IntersectTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bedtools" => Ok(Self::Bedtools),
            "builtin" => Ok(Self::Builtin),
            _ => Err(format!("Unknown intersect tool: {}", s)),
        }
    }
}

/// Panel intersection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectSettings {
    /// Implementation to use
    pub tool: IntersectTool,

    /// Explicit bedtools binary (looked up on PATH when unset)
    pub bedtools: Option<PathBuf>,

    /// Directory holding `<panel>.bed` files, relative to the input root
    pub panel_dir: PathBuf,

    /// Extra arguments appended to `bedtools intersect`
    pub extra_args: Vec<String>,
}

impl Default for IntersectSettings {
    fn default() -> Self {
        Self {
            tool: IntersectTool::Bedtools,
            bedtools: None,
            panel_dir: PathBuf::from("reference_panels"),
            extra_args: Vec::new(),
        }
    }
}

/// Command-line values that take precedence over the settings file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub min_lines: Option<usize>,
    pub intersect_tool: Option<IntersectTool>,
    pub bedtools: Option<PathBuf>,
}

impl Settings {
    /// Load settings from a YAML or TOML file, chosen by extension
    pub fn from_file(path: &Path) -> Read2vecResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Read2vecError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        let settings = if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_yaml(&content)
        }
        .map_err(|message| Read2vecError::Config {
            path: path.to_path_buf(),
            message,
        })?;

        settings.check().map_err(|message| Read2vecError::Config {
            path: path.to_path_buf(),
            message,
        })?;

        Ok(settings)
    }

    /// Parse settings from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| e.to_string())
    }

    /// Parse settings from TOML
    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Resolve the settings for a run
    ///
    /// Order: the explicit file, `<input_root>/read2vec.yaml`, the user
    /// config directory, then built-in defaults. Overrides apply last.
    pub fn resolve(
        explicit: Option<&Path>,
        input_root: &Path,
        overrides: &Overrides,
    ) -> Read2vecResult<Self> {
        let mut settings = match Self::locate(explicit, input_root) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading settings");
                Self::from_file(&path)?
            }
            None => {
                tracing::debug!("no settings file found, using defaults");
                Self::default()
            }
        };

        settings.apply(overrides);
        settings.check().map_err(|message| Read2vecError::Usage { message })?;
        Ok(settings)
    }

    fn locate(explicit: Option<&Path>, input_root: &Path) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let project = input_root.join(PROJECT_SETTINGS_FILE);
        if project.is_file() {
            return Some(project);
        }

        directories::ProjectDirs::from("", "", "read2vec")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
            .filter(|p| p.is_file())
    }

    /// Apply command-line overrides
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(min_lines) = overrides.min_lines {
            self.min_lines = min_lines;
        }
        if let Some(tool) = overrides.intersect_tool {
            self.intersect.tool = tool;
        }
        if let Some(ref bedtools) = overrides.bedtools {
            self.intersect.bedtools = Some(bedtools.clone());
        }
    }

    fn check(&self) -> Result<(), String> {
        if self.min_lines == 0 {
            return Err("min_lines must be at least 1".into());
        }
        for (key, value) in [
            ("layout.gmsv_subdir", &self.layout.gmsv_subdir),
            ("layout.report_dir", &self.layout.report_dir),
            ("layout.output_dir", &self.layout.output_dir),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{} must not be empty", key));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
min_lines: 10
intersect:
  tool: builtin
  panel_dir: /panels
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.min_lines, 10);
        assert_eq!(settings.intersect.tool, IntersectTool::Builtin);
        assert_eq!(settings.intersect.panel_dir, PathBuf::from("/panels"));
        assert_eq!(settings.layout, Layout::default());
    }

    #[test]
    fn test_toml_file_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "min_lines = 3\n[layout]\noutput_dir = \"out\"\n[intersect]\nextra_args = [\"-f\", \"0.5\"]\n",
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.min_lines, 3);
        assert_eq!(settings.layout.output_dir, "out");
        assert_eq!(settings.layout.gmsv_subdir, "07.gMSV");
        assert_eq!(settings.intersect.extra_args, vec!["-f", "0.5"]);
    }

    #[test]
    fn test_zero_min_lines_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("read2vec.yaml");
        std::fs::write(&path, "min_lines: 0\n").unwrap();

        let err = Settings::from_file(&path).unwrap_err();
        assert!(matches!(err, Read2vecError::Config { .. }));
    }

    #[test]
    fn test_project_file_and_overrides() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(PROJECT_SETTINGS_FILE),
            "min_lines: 8\nintersect:\n  tool: bedtools\n",
        )
        .unwrap();

        let overrides = Overrides {
            intersect_tool: Some(IntersectTool::Builtin),
            ..Default::default()
        };
        let settings = Settings::resolve(None, temp_dir.path(), &overrides).unwrap();

        assert_eq!(settings.min_lines, 8);
        assert_eq!(settings.intersect.tool, IntersectTool::Builtin);
    }

    #[test]
    fn test_intersect_tool_from_str() {
        assert_eq!("BEDTOOLS".parse::<IntersectTool>().unwrap(), IntersectTool::Bedtools);
        assert!("awk".parse::<IntersectTool>().is_err());
    }
}
