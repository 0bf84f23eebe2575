// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::ConstraintFileError;

use core::fmt;
use core::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

/// Latest expression grammar understood by this crate.
pub const EXPRESSION_VERSION: &str = "2.0";

/// Grammar majors this evaluator accepts.
const SUPPORTED_MAJORS: [u32; 2] = [1, 2];

lazy_static! {
    static ref VERSION_PATTERN: Regex =
        Regex::new(r"^([0-9]+)\.([0-9]+)$").expect("valid pattern");
}

/// An `expression_version` of the form `major.minor`. Only the major
/// version affects which constructs are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpressionVersion {
    pub major: u32,
    pub minor: u32,
}

impl ExpressionVersion {
    pub const V1: ExpressionVersion = ExpressionVersion { major: 1, minor: 0 };
    pub const V2: ExpressionVersion = ExpressionVersion { major: 2, minor: 0 };
    pub const LATEST: ExpressionVersion = Self::V2;

    pub fn is_supported(&self) -> bool {
        SUPPORTED_MAJORS.contains(&self.major)
    }

    /// Whether a construct introduced in grammar `major` may be used.
    pub fn allows(&self, major: u32) -> bool {
        self.major >= major
    }

    /// Parse and require a supported major.
    pub fn parse_supported(version: &str) -> Result<Self, ConstraintFileError> {
        let v = Self::from_str(version)?;
        if !v.is_supported() {
            return Err(ConstraintFileError::UnsupportedExpressionVersion(
                version.to_string(),
            ));
        }
        Ok(v)
    }
}

impl Default for ExpressionVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl FromStr for ExpressionVersion {
    type Err = ConstraintFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ConstraintFileError::MalformedExpressionVersion(s.to_string());
        let caps = VERSION_PATTERN.captures(s).ok_or_else(malformed)?;
        let major = caps[1].parse::<u32>().map_err(|_| malformed())?;
        let minor = caps[2].parse::<u32>().map_err(|_| malformed())?;
        Ok(Self { major, minor })
    }
}

impl fmt::Display for ExpressionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Whether an evaluator built from this crate accepts expressions written
/// against `version`. Malformed versions are not supported.
pub fn expression_version_supported(version: &str) -> bool {
    ExpressionVersion::from_str(version)
        .map(|v| v.is_supported())
        .unwrap_or(false)
}
