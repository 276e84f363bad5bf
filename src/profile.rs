//! Scan configuration: which rules run, at what confidence, over which
//! paths.
//!
//! A profile is resolved once per scan from an optional `ppopt.yaml`
//! file plus command-line overrides, validated against the rule
//! registry, and read-only afterwards, which is what makes it safe to
//! share across scan workers.

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::rules::{Confidence, Registry, RuleError, Severity};

/// On-disk profile schema (`ppopt.yaml`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileFile {
    /// Rule ids to enable. Absent means all registered rules.
    #[serde(default)]
    pub rules: Option<Vec<String>>,
    /// Rule ids to disable after selection.
    #[serde(default)]
    pub disable: Vec<String>,
    /// Findings below this confidence are dropped.
    #[serde(default)]
    pub min_confidence: Option<Confidence>,
    /// Glob patterns for paths to exclude from the scan.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Findings at or above this severity fail the scan.
    #[serde(default)]
    pub fail_on: Option<Severity>,
}

impl ProfileFile {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse profile {}", path.display()))
    }
}

/// Command-line overrides applied on top of the profile file.
#[derive(Debug, Clone, Default)]
pub struct ProfileOverrides {
    pub select: Option<Vec<String>>,
    pub disable: Vec<String>,
    pub min_confidence: Option<Confidence>,
    pub exclude: Vec<String>,
    pub fail_on: Option<Severity>,
}

/// The resolved, immutable configuration for one scan.
#[derive(Debug)]
pub struct Profile {
    enabled_rules: HashSet<String>,
    pub confidence_floor: Confidence,
    excludes: GlobSet,
    exclude_patterns: Vec<String>,
    pub fail_on: Severity,
}

impl Profile {
    /// Resolve a profile, validating every referenced rule id against the
    /// registry. Unknown ids and bad globs are configuration errors,
    /// fatal before any scanning begins.
    pub fn resolve(
        registry: &Registry,
        file: Option<&ProfileFile>,
        overrides: &ProfileOverrides,
    ) -> anyhow::Result<Profile> {
        let selection = overrides
            .select
            .as_ref()
            .or_else(|| file.and_then(|f| f.rules.as_ref()));

        let mut enabled: HashSet<String> = match selection {
            Some(ids) => {
                for id in ids {
                    check_known(registry, id)?;
                }
                ids.iter().cloned().collect()
            }
            None => registry.all().map(|r| r.id.to_string()).collect(),
        };

        let file_disable = file.map(|f| f.disable.as_slice()).unwrap_or(&[]);
        for id in file_disable.iter().chain(overrides.disable.iter()) {
            check_known(registry, id)?;
            enabled.remove(id);
        }

        let confidence_floor = overrides
            .min_confidence
            .or_else(|| file.and_then(|f| f.min_confidence))
            .unwrap_or(Confidence::Low);

        let fail_on = overrides
            .fail_on
            .or_else(|| file.and_then(|f| f.fail_on))
            .unwrap_or(Severity::Error);

        let mut exclude_patterns: Vec<String> =
            file.map(|f| f.exclude.clone()).unwrap_or_default();
        exclude_patterns.extend(overrides.exclude.iter().cloned());

        let mut builder = GlobSetBuilder::new();
        for pattern in &exclude_patterns {
            let glob = Glob::new(pattern)
                .with_context(|| format!("invalid exclude pattern {:?}", pattern))?;
            builder.add(glob);
        }
        let excludes = builder.build().context("failed to compile exclude set")?;

        Ok(Profile {
            enabled_rules: enabled,
            confidence_floor,
            excludes,
            exclude_patterns,
            fail_on,
        })
    }

    /// A profile with every registered rule enabled and no filtering.
    pub fn default_for(registry: &Registry) -> Profile {
        Profile::resolve(registry, None, &ProfileOverrides::default())
            .unwrap_or_else(|e| panic!("default profile should always resolve: {}", e))
    }

    pub fn rule_enabled(&self, id: &str) -> bool {
        self.enabled_rules.contains(id)
    }

    pub fn is_excluded<P: AsRef<Path>>(&self, path: P) -> bool {
        self.excludes.is_match(path.as_ref())
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }
}

fn check_known(registry: &Registry, id: &str) -> Result<(), RuleError> {
    if registry.contains(id) {
        Ok(())
    } else {
        Err(RuleError::Unknown(id.to_string()))
    }
}
