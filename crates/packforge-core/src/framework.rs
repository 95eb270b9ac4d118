//! Target framework identifiers.
//!
//! Frameworks are written either as short folder names (`net45`,
//! `netstandard1.3`, `portable-net45+win8`) or as full names
//! (`.NETFramework,Version=v4.5`). Identifiers that are not recognized parse
//! to [`TargetFramework::Unsupported`] rather than failing, so the caller
//! decides whether an unsupported framework is fatal.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Known framework identifiers as (short name, full identifier).
const KNOWN_FRAMEWORKS: &[(&str, &str)] = &[
    ("net", ".NETFramework"),
    ("netstandard", ".NETStandard"),
    ("netstandardapp", ".NETStandardApp"),
    ("netcoreapp", ".NETCoreApp"),
    ("netcore", ".NETCore"),
    ("dnx", "DNX"),
    ("dnxcore", "DNXCore"),
    ("uap", "UAP"),
    ("win", "Windows"),
    ("wp", "WindowsPhone"),
    ("wpa", "WindowsPhoneApp"),
    ("sl", "Silverlight"),
    ("monoandroid", "MonoAndroid"),
    ("monotouch", "MonoTouch"),
    ("xamarinios", "Xamarin.iOS"),
    ("xamarinmac", "Xamarin.Mac"),
    ("native", "native"),
];

const PORTABLE_SHORT: &str = "portable";
const PORTABLE_IDENTIFIER: &str = ".NETPortable";

/// Frameworks whose folder names always keep dots between version components.
const DOTTED_VERSIONS: &[&str] = &["netstandard", "netstandardapp", "netcoreapp"];

/// A target framework.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetFramework {
    /// Applies to every framework; used for framework-agnostic dependency groups.
    Any,
    /// A recognized framework.
    Specific(FrameworkName),
    /// A framework that could not be recognized, as originally written.
    Unsupported(String),
}

/// A recognized framework with its version and optional profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameworkName {
    short: &'static str,
    identifier: &'static str,
    version: Vec<u32>,
    profile: Option<String>,
}

impl TargetFramework {
    /// Parse a short or full framework name.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case("any") {
            return Self::Any;
        }

        let parsed = if trimmed.contains(',') {
            FrameworkName::parse_full(trimmed)
        } else {
            FrameworkName::parse_short(trimmed)
        };

        parsed.map_or_else(|| Self::Unsupported(trimmed.to_string()), Self::Specific)
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// The folder name used inside a package (`net45`, `netstandard1.3`).
    #[must_use]
    pub fn short_folder_name(&self) -> String {
        match self {
            Self::Any => "any".to_string(),
            Self::Specific(name) => name.short_folder_name(),
            Self::Unsupported(_) => "unsupported".to_string(),
        }
    }
}

impl fmt::Display for TargetFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Specific(name) => f.write_str(&name.short_folder_name()),
            Self::Unsupported(raw) => f.write_str(raw),
        }
    }
}

impl FromStr for TargetFramework {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for TargetFramework {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FrameworkName {
    /// The full identifier, e.g. `.NETFramework`.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.identifier
    }

    /// Version components with trailing zeros trimmed to at least two.
    #[must_use]
    pub fn version(&self) -> &[u32] {
        &self.version
    }

    #[must_use]
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// The full framework name, e.g. `.NETFramework,Version=v4.5`.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.short == PORTABLE_SHORT {
            let profile = self.profile.as_deref().unwrap_or_default();
            return format!("{},Profile={}", self.identifier, profile);
        }
        let mut name = format!("{},Version=v{}", self.identifier, self.dotted_version());
        if let Some(profile) = &self.profile {
            name.push_str(",Profile=");
            name.push_str(profile);
        }
        name
    }

    fn short_folder_name(&self) -> String {
        if self.short == PORTABLE_SHORT {
            let profile = self.profile.as_deref().unwrap_or_default();
            return format!("{PORTABLE_SHORT}-{profile}");
        }

        let mut name = self.short.to_string();
        if self.version.iter().any(|&c| c != 0) {
            if DOTTED_VERSIONS.contains(&self.short) || self.version.iter().any(|&c| c > 9) {
                name.push_str(&self.dotted_version());
            } else {
                for component in &self.version {
                    name.push_str(&component.to_string());
                }
            }
        }
        if let Some(profile) = &self.profile {
            name.push('-');
            name.push_str(profile);
        }
        name
    }

    fn dotted_version(&self) -> String {
        self.version
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    fn parse_short(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();

        if let Some(profile) = lower.strip_prefix("portable-") {
            if profile.is_empty() {
                return None;
            }
            return Some(Self {
                short: PORTABLE_SHORT,
                identifier: PORTABLE_IDENTIFIER,
                version: vec![0, 0],
                profile: Some(profile.to_string()),
            });
        }

        let (main, profile) = match lower.split_once('-') {
            Some((main, profile)) if !profile.is_empty() => (main, Some(profile.to_string())),
            Some(_) => return None,
            None => (lower.as_str(), None),
        };

        let split = main
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(main.len());
        let (short, version_text) = main.split_at(split);
        let (short, identifier) = KNOWN_FRAMEWORKS
            .iter()
            .find(|(known, _)| *known == short)
            .copied()?;

        Some(Self {
            short,
            identifier,
            version: parse_version_components(version_text)?,
            profile,
        })
    }

    fn parse_full(name: &str) -> Option<Self> {
        let mut parts = name.split(',').map(str::trim);
        let identifier = parts.next()?;

        let (short, identifier) = if identifier.eq_ignore_ascii_case(PORTABLE_IDENTIFIER) {
            (PORTABLE_SHORT, PORTABLE_IDENTIFIER)
        } else {
            KNOWN_FRAMEWORKS
                .iter()
                .find(|(_, known)| known.eq_ignore_ascii_case(identifier))
                .copied()?
        };

        let mut version = vec![0, 0];
        let mut profile = None;
        for part in parts {
            let (key, value) = part.split_once('=')?;
            match key.trim().to_ascii_lowercase().as_str() {
                "version" => {
                    let value = value.trim();
                    let value = value
                        .strip_prefix('v')
                        .or_else(|| value.strip_prefix('V'))
                        .unwrap_or(value);
                    if !value.contains('.') {
                        return None;
                    }
                    version = parse_version_components(value)?;
                }
                "profile" => profile = Some(value.trim().to_ascii_lowercase()),
                _ => return None,
            }
        }

        if short == PORTABLE_SHORT && profile.is_none() {
            return None;
        }

        Some(Self {
            short,
            identifier,
            version,
            profile,
        })
    }
}

/// Parse `45` as 4.5 and `1.3` as 1.3, trimming trailing zeros to two components.
fn parse_version_components(text: &str) -> Option<Vec<u32>> {
    let mut components = if text.is_empty() {
        Vec::new()
    } else if text.contains('.') {
        text.split('.')
            .map(|part| part.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?
    } else {
        text.chars()
            .map(|c| c.to_digit(10))
            .collect::<Option<Vec<_>>>()?
    };

    while components.len() > 2 && components.last() == Some(&0) {
        components.pop();
    }
    while components.len() < 2 {
        components.push(0);
    }
    Some(components)
}
