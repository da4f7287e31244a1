// src/project.rs

//! Project manifest parsing
//!
//! A project is described by a YAML file:
//!
//! ```yaml
//! project:
//!   name: spatial-analysis
//! options:
//!   current_r: "4.2.2"
//!   prefer_bioc_release: "3.19"
//! targets:
//!   - package: dplyr
//!     source: cran
//!     constraint: ">= 1.1.0"
//!   - package: DESeq2
//!     source: bioc
//!     bioc_release: "3.19"
//!   - package: tidyverse/ggplot2
//!     source: github
//!     ref: main
//!     optional: true
//! ```

use crate::error::{Error, Result};
use crate::metadata::{PackageRef, Requirement, Source};
use crate::repository::bioconductor;
use crate::resolver::ResolveOptions;
use crate::version::{Constraint, RVersion};
use serde::Deserialize;
use std::path::Path;

/// Parsed project manifest
#[derive(Debug, Deserialize)]
pub struct ProjectManifest {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub options: OptionsSection,

    #[serde(default)]
    pub targets: Vec<TargetSpec>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectSection {
    #[serde(default)]
    pub name: String,
}

/// The `options` block; every key is optional
#[derive(Debug, Default, Deserialize)]
pub struct OptionsSection {
    pub current_r: Option<String>,
    pub prefer_bioc_release: Option<String>,
    #[serde(default)]
    pub include_optional: bool,
    pub lock_r: Option<String>,
    pub github_token: Option<String>,
}

/// One target entry; `source` is required
#[derive(Debug, Deserialize)]
pub struct TargetSpec {
    pub package: String,
    pub source: Source,
    pub constraint: Option<String>,
    pub bioc_release: Option<String>,
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub optional: bool,
    /// Accepted for compatibility with hand-written manifests; identity is
    /// always the package name.
    pub alias: Option<String>,
}

impl ProjectManifest {
    /// Load and validate a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidManifest(format!("cannot read {}: {}", path.display(), e)))?;
        let mut manifest: ProjectManifest = serde_yaml::from_str(&raw)
            .map_err(|e| Error::InvalidManifest(format!("{}: {}", path.display(), e)))?;
        if manifest.project.name.is_empty() {
            manifest.project.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "project".to_string());
        }
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check fields that serde cannot: version strings, constraints, slugs
    pub fn validate(&self) -> Result<()> {
        for field in [&self.options.current_r, &self.options.lock_r]
            .into_iter()
            .flatten()
        {
            RVersion::parse(field)
                .map_err(|_| Error::InvalidManifest(format!("invalid R version '{}'", field)))?;
        }

        for target in &self.targets {
            if target.package.is_empty() {
                return Err(Error::InvalidManifest("target with empty package".to_string()));
            }
            match target.source {
                Source::Github => {
                    if !target.package.contains('/') {
                        return Err(Error::InvalidManifest(format!(
                            "GitHub target '{}' must use owner/repo format",
                            target.package
                        )));
                    }
                }
                _ => {
                    if target.package.contains('/') {
                        return Err(Error::InvalidManifest(format!(
                            "target '{}' is not a plain package name",
                            target.package
                        )));
                    }
                }
            }
            if let Some(expr) = &target.constraint {
                Constraint::parse(expr).map_err(|_| {
                    Error::InvalidManifest(format!(
                        "target '{}': invalid constraint '{}'",
                        target.package, expr
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Resolver options derived from the manifest, with CLI overrides applied
    pub fn resolve_options(
        &self,
        lock_r: Option<&str>,
        prefer_bioc: Option<&str>,
        include_optional: bool,
    ) -> Result<ResolveOptions> {
        let parse = |value: Option<&str>| -> Result<Option<RVersion>> {
            value.map(RVersion::parse).transpose()
        };
        Ok(ResolveOptions {
            current_r: parse(self.options.current_r.as_deref())?,
            lock_r: parse(lock_r.or(self.options.lock_r.as_deref()))?,
            prefer_bioc_release: prefer_bioc
                .map(str::to_string)
                .or_else(|| self.options.prefer_bioc_release.clone()),
            include_optional: include_optional || self.options.include_optional,
        })
    }

    /// Root requirements for the resolver
    ///
    /// Bioconductor targets without an explicit release get the preferred
    /// one, falling back to the latest known release. GitHub targets are
    /// keyed by slug here; the resolver substitutes the DESCRIPTION name.
    pub fn requirements(&self, prefer_bioc: Option<&str>) -> Result<Vec<Requirement>> {
        let mut requirements = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let constraint = match &target.constraint {
                Some(expr) => Constraint::parse(expr)?,
                None => Constraint::any(),
            };
            let package = match target.source {
                Source::Cran => PackageRef::cran(&target.package),
                Source::Bioc => {
                    let release = target
                        .bioc_release
                        .as_deref()
                        .or(prefer_bioc)
                        .or(self.options.prefer_bioc_release.as_deref())
                        .unwrap_or_else(|| bioconductor::latest_release());
                    PackageRef::bioc(&target.package, release)
                }
                Source::Github => {
                    let locator = match &target.git_ref {
                        Some(git_ref) => format!("{}@{}", target.package, git_ref),
                        None => target.package.clone(),
                    };
                    PackageRef::github(&target.package, locator)
                }
            };
            requirements.push(Requirement {
                package,
                constraint,
                optional: target.optional,
            });
        }
        Ok(requirements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> ProjectManifest {
        let manifest: ProjectManifest = serde_yaml::from_str(yaml).unwrap();
        manifest.validate().unwrap();
        manifest
    }

    #[test]
    fn test_parse_full_manifest() {
        let manifest = parse(
            r#"
project:
  name: spatial-analysis
options:
  current_r: "4.2.2"
  prefer_bioc_release: "3.19"
  include_optional: true
targets:
  - package: dplyr
    source: cran
    constraint: ">= 1.1.0"
  - package: DESeq2
    source: bioc
    bioc_release: "3.19"
  - package: tidyverse/ggplot2
    source: github
    ref: main
    optional: true
"#,
        );
        assert_eq!(manifest.project.name, "spatial-analysis");
        assert_eq!(manifest.targets.len(), 3);
        assert!(manifest.options.include_optional);

        let requirements = manifest.requirements(None).unwrap();
        assert_eq!(requirements[0].package, PackageRef::cran("dplyr"));
        assert_eq!(requirements[1].package, PackageRef::bioc("DESeq2", "3.19"));
        assert_eq!(
            requirements[2].package,
            PackageRef::github("tidyverse/ggplot2", "tidyverse/ggplot2@main")
        );
        assert!(requirements[2].optional);
    }

    #[test]
    fn test_bioc_target_gets_preferred_release() {
        let manifest = parse(
            r#"
targets:
  - package: limma
    source: bioc
"#,
        );
        let requirements = manifest.requirements(Some("3.17")).unwrap();
        assert_eq!(requirements[0].package.locator.as_deref(), Some("3.17"));

        let fallback = manifest.requirements(None).unwrap();
        assert_eq!(
            fallback[0].package.locator.as_deref(),
            Some(bioconductor::latest_release())
        );
    }

    #[test]
    fn test_github_target_requires_slug() {
        let manifest: ProjectManifest = serde_yaml::from_str(
            r#"
targets:
  - package: ggplot2
    source: github
"#,
        )
        .unwrap();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_cran_target_rejects_slug() {
        let manifest: ProjectManifest = serde_yaml::from_str(
            r#"
targets:
  - package: tidyverse/dplyr
    source: cran
"#,
        )
        .unwrap();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_invalid_constraint_rejected() {
        let manifest: ProjectManifest = serde_yaml::from_str(
            r#"
targets:
  - package: dplyr
    source: cran
    constraint: "~> 1.0"
"#,
        )
        .unwrap();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_invalid_r_version_rejected() {
        let manifest: ProjectManifest = serde_yaml::from_str(
            r#"
options:
  current_r: "four point two"
targets: []
"#,
        )
        .unwrap();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let result: std::result::Result<ProjectManifest, _> = serde_yaml::from_str(
            r#"
targets:
  - package: dplyr
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides_win() {
        let manifest = parse(
            r#"
options:
  lock_r: "4.1.0"
  prefer_bioc_release: "3.18"
targets: []
"#,
        );
        let options = manifest
            .resolve_options(Some("4.3.0"), Some("3.19"), false)
            .unwrap();
        assert_eq!(options.lock_r, Some(RVersion::parse("4.3.0").unwrap()));
        assert_eq!(options.prefer_bioc_release.as_deref(), Some("3.19"));
    }
}
