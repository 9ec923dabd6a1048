//! Heuristic license-type detection from raw license text
//!
//! Detection is a fixed, ordered rule table. Each rule pairs a trigger phrase
//! with an optional secondary marker, and the first rule whose patterns both
//! match decides the license. Most patterns are anchored to the start or end
//! of a trimmed line so that license names quoted inside prose do not count.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical license types the matcher can recognize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseKind {
    #[serde(rename = "MIT")]
    Mit,
    #[serde(rename = "NewBSD")]
    NewBsd,
    #[serde(rename = "FreeBSD")]
    FreeBsd,
    #[serde(rename = "Apache-2.0")]
    Apache20,
    #[serde(rename = "MPL-2.0")]
    Mpl20,
    #[serde(rename = "GPL-2.0")]
    Gpl20,
    #[serde(rename = "GPL-3.0")]
    Gpl30,
    #[serde(rename = "LGPL-2.1")]
    Lgpl21,
    #[serde(rename = "LGPL-3.0")]
    Lgpl30,
    #[serde(rename = "CDDL-1.0")]
    Cddl10,
    #[serde(rename = "EPL-1.0")]
    Epl10,
}

impl LicenseKind {
    pub const ALL: [LicenseKind; 11] = [
        LicenseKind::Mit,
        LicenseKind::NewBsd,
        LicenseKind::FreeBsd,
        LicenseKind::Apache20,
        LicenseKind::Mpl20,
        LicenseKind::Gpl20,
        LicenseKind::Gpl30,
        LicenseKind::Lgpl21,
        LicenseKind::Lgpl30,
        LicenseKind::Cddl10,
        LicenseKind::Epl10,
    ];

    /// The identifier policies refer to this license by
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mit => "MIT",
            Self::NewBsd => "NewBSD",
            Self::FreeBsd => "FreeBSD",
            Self::Apache20 => "Apache-2.0",
            Self::Mpl20 => "MPL-2.0",
            Self::Gpl20 => "GPL-2.0",
            Self::Gpl30 => "GPL-3.0",
            Self::Lgpl21 => "LGPL-2.1",
            Self::Lgpl30 => "LGPL-3.0",
            Self::Cddl10 => "CDDL-1.0",
            Self::Epl10 => "EPL-1.0",
        }
    }

    /// Look up a license by its identifier (exact, case-sensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for LicenseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in a line a pattern has to appear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Prefix of a trimmed line
    Left,
    /// Suffix of a trimmed line
    Right,
    /// Anywhere in the text
    Anywhere,
}

#[derive(Debug, Clone, Copy)]
pub struct Pattern {
    pub anchor: Anchor,
    pub text: &'static str,
}

impl Pattern {
    pub const fn left(text: &'static str) -> Self {
        Self {
            anchor: Anchor::Left,
            text,
        }
    }

    pub const fn right(text: &'static str) -> Self {
        Self {
            anchor: Anchor::Right,
            text,
        }
    }

    pub const fn anywhere(text: &'static str) -> Self {
        Self {
            anchor: Anchor::Anywhere,
            text,
        }
    }

    fn matches(&self, text: &str, lines: &[&str]) -> bool {
        match self.anchor {
            Anchor::Left => lines.iter().any(|line| line.starts_with(self.text)),
            Anchor::Right => lines.iter().any(|line| line.ends_with(self.text)),
            Anchor::Anywhere => text.contains(self.text),
        }
    }
}

/// One row of the detection table
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub trigger: Pattern,
    pub secondary: Option<Pattern>,
    pub kind: LicenseKind,
}

impl Rule {
    const fn new(trigger: Pattern, kind: LicenseKind) -> Self {
        Self {
            trigger,
            secondary: None,
            kind,
        }
    }

    const fn with(trigger: Pattern, secondary: Pattern, kind: LicenseKind) -> Self {
        Self {
            trigger,
            secondary: Some(secondary),
            kind,
        }
    }

    fn matches(&self, text: &str, lines: &[&str]) -> bool {
        self.trigger.matches(text, lines)
            && self
                .secondary
                .map_or(true, |secondary| secondary.matches(text, lines))
    }
}

const BSD_PREAMBLE: Pattern = Pattern::left("Redistribution and use in source and binary forms");

/// Detection rules in evaluation order. BSD variants share a preamble and
/// are told apart only by their secondary marker, so their order matters.
pub const RULES: &[Rule] = &[
    Rule::new(Pattern::left("The MIT License"), LicenseKind::Mit),
    Rule::with(
        Pattern::left("Apache License"),
        Pattern::left("Version 2.0"),
        LicenseKind::Apache20,
    ),
    Rule::with(
        Pattern::left("GNU GENERAL PUBLIC LICENSE"),
        Pattern::left("Version 2"),
        LicenseKind::Gpl20,
    ),
    Rule::with(
        Pattern::left("GNU GENERAL PUBLIC LICENSE"),
        Pattern::left("Version 3"),
        LicenseKind::Gpl30,
    ),
    Rule::with(
        Pattern::left("GNU LESSER GENERAL PUBLIC LICENSE"),
        Pattern::left("Version 2.1"),
        LicenseKind::Lgpl21,
    ),
    Rule::with(
        Pattern::left("GNU LESSER GENERAL PUBLIC LICENSE"),
        Pattern::left("Version 3"),
        LicenseKind::Lgpl30,
    ),
    Rule::new(
        Pattern::left("Mozilla Public License Version 2.0"),
        LicenseKind::Mpl20,
    ),
    Rule::with(
        BSD_PREAMBLE,
        Pattern::left("* Redistribution"),
        LicenseKind::NewBsd,
    ),
    Rule::with(
        BSD_PREAMBLE,
        Pattern::right("FreeBSD Project."),
        LicenseKind::FreeBsd,
    ),
    Rule::with(
        BSD_PREAMBLE,
        Pattern::anywhere("Neither"),
        LicenseKind::NewBsd,
    ),
    Rule::with(
        Pattern::right("(CDDL)"),
        Pattern::left("Version 1.0"),
        LicenseKind::Cddl10,
    ),
    Rule::new(
        Pattern::left("Eclipse Public License - v 1.0"),
        LicenseKind::Epl10,
    ),
];

/// Guess the license type described by `text`.
///
/// Returns `None` when no rule matches.
pub fn classify_text(text: &str) -> Option<LicenseKind> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    RULES
        .iter()
        .find(|rule| rule.matches(text, &lines))
        .map(|rule| rule.kind)
}

/// Check whether any trimmed line of `text` starts with `needle`
pub fn scan_left(text: &str, needle: &str) -> bool {
    text.lines().any(|line| line.trim().starts_with(needle))
}

/// Check whether any trimmed line of `text` ends with `needle`
pub fn scan_right(text: &str, needle: &str) -> bool {
    text.lines().any(|line| line.trim().ends_with(needle))
}
