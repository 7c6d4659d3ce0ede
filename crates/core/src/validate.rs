//! Document validation: every reference must resolve, names must be unique
//! across all four categories, and curve arity must hold.
//!
//! Unlike extraction, validation never short-circuits: every violation in
//! the document is collected and reported together, and a document with any
//! violation is rejected as a unit.

use std::collections::HashSet;

use crate::index::ResolvedIndex;
use crate::model::*;

/// The aggregated validation report: one human-readable message per
/// violation, in table order (uniqueness, then values, poses, beziers,
/// path chains, each alphabetically).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(pub Vec<String>);

impl Violations {
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for Violations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("\n"))
    }
}

impl std::error::Error for Violations {}

/// Run all checks over the index. `Ok(())` only when no check found
/// anything.
pub fn validate(index: &ResolvedIndex) -> Result<(), Violations> {
    let mut checker = Checker {
        index,
        violations: Vec::new(),
    };
    checker.check_unique_names();
    for name in sorted_keys(index.values.keys()) {
        checker.check_value_binding(&index.values[&name], &name);
    }
    for name in sorted_keys(index.poses.keys()) {
        checker.check_pose_ref(&index.poses[&name], &name);
    }
    for name in sorted_keys(index.beziers.keys()) {
        checker.check_bezier_ref(&index.beziers[&name], &name);
    }
    for name in sorted_keys(index.path_chains.keys()) {
        checker.check_chain(&index.path_chains[&name], &name);
    }
    if checker.violations.is_empty() {
        Ok(())
    } else {
        Err(Violations(checker.violations))
    }
}

fn sorted_keys<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut v: Vec<String> = keys.cloned().collect();
    v.sort();
    v
}

struct Checker<'a> {
    index: &'a ResolvedIndex,
    violations: Vec<String>,
}

impl Checker<'_> {
    fn report(&mut self, message: String) {
        self.violations.push(message);
    }

    /// Cross-category uniqueness: the union of all names must be as large
    /// as the four tables combined. One violation, naming the collisions.
    fn check_unique_names(&mut self) {
        let idx = self.index;
        let total =
            idx.values.len() + idx.poses.len() + idx.beziers.len() + idx.path_chains.len();
        let mut all: HashSet<&String> = HashSet::new();
        let mut duplicated: Vec<&String> = Vec::new();
        for name in idx
            .values
            .keys()
            .chain(idx.poses.keys())
            .chain(idx.beziers.keys())
            .chain(idx.path_chains.keys())
        {
            if !all.insert(name) {
                duplicated.push(name);
            }
        }
        if all.len() != total {
            duplicated.sort();
            duplicated.dedup();
            self.report(format!(
                "duplicate names across values, poses, beziers, and path chains: {}",
                duplicated
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }

    fn check_value_ref(&mut self, vr: &ValueRef, id: &str) {
        if let ValueRef::Name(name) = vr {
            if !self.index.values.contains_key(name) {
                self.report(format!(
                    "{}'s \"{}\" value reference appears to be undefined",
                    id, name
                ));
            }
        }
    }

    /// A named value may be bound to a reference (directly or through a
    /// radians wrapper); those names resolve through the value table only.
    fn check_value_binding(&mut self, binding: &ValueBinding, id: &str) {
        match binding {
            ValueBinding::Scalar(vr) => self.check_value_ref(vr, id),
            ValueBinding::Radians(r) => {
                self.check_value_ref(&r.radians, &format!("{}'s radians ref", id))
            }
        }
    }

    /// A bare heading name may denote a value or a pose whose own heading
    /// is reused; the failure message is pose-flavored because the value
    /// table was already ruled out.
    fn check_heading_ref(&mut self, hr: &HeadingRef, id: &str) {
        match hr {
            HeadingRef::Radians(r) => {
                self.check_value_ref(&r.radians, &format!("{}'s radians ref", id))
            }
            HeadingRef::Ref(ValueRef::Value(_)) => {}
            HeadingRef::Ref(ValueRef::Name(name)) => {
                if !self.index.values.contains_key(name) && !self.index.poses.contains_key(name) {
                    self.report(format!(
                        "{}'s \"{}\" pose reference appears to be undefined",
                        id, name
                    ));
                }
            }
        }
    }

    fn check_anonymous_pose(&mut self, pose: &AnonymousPose, id: &str) {
        if let Some(heading) = &pose.heading {
            self.check_heading_ref(heading, &format!("{}'s heading", id));
        }
        self.check_value_ref(&pose.x, &format!("{}'s x coordinate", id));
        self.check_value_ref(&pose.y, &format!("{}'s y coordinate", id));
    }

    fn check_pose_ref(&mut self, pr: &PoseRef, id: &str) {
        match pr {
            PoseRef::Name(name) => {
                if !self.index.poses.contains_key(name) {
                    self.report(format!(
                        "{}'s \"{}\" pose reference appears to be undefined",
                        id, name
                    ));
                }
            }
            PoseRef::Pose(pose) => self.check_anonymous_pose(pose, id),
        }
    }

    fn check_anonymous_bezier(&mut self, bezier: &AnonymousBezier, id: &str) {
        for (i, pr) in bezier.points.iter().enumerate() {
            self.check_pose_ref(pr, &format!("{}'s element {}", id, i));
        }
        match bezier.kind {
            BezierKind::Line if bezier.points.len() != 2 => {
                self.report(format!("{}'s line doesn't have 2 points", id));
            }
            BezierKind::Curve if bezier.points.len() < 2 => {
                self.report(format!("{}'s curve doesn't have enough points", id));
            }
            _ => {}
        }
    }

    fn check_bezier_ref(&mut self, br: &BezierRef, id: &str) {
        match br {
            BezierRef::Name(name) => {
                if !self.index.beziers.contains_key(name) {
                    self.report(format!(
                        "{}'s \"{}\" bezier reference appears to be undefined",
                        id, name
                    ));
                }
            }
            BezierRef::Bezier(bezier) => self.check_anonymous_bezier(bezier, id),
        }
    }

    fn check_chain(&mut self, chain: &crate::index::ChainDef, id: &str) {
        match &chain.heading {
            HeadingType::Tangent => {}
            HeadingType::Constant { heading } => {
                self.check_heading_ref(heading, &format!("{}'s constant heading ref", id));
            }
            HeadingType::Interpolated { headings } => {
                self.check_heading_ref(&headings[0], &format!("{}'s start heading ref", id));
                self.check_heading_ref(&headings[1], &format!("{}'s end heading ref", id));
            }
        }
        for (i, br) in chain.paths.iter().enumerate() {
            self.check_bezier_ref(br, &format!("{}'s path element {}", id, i));
        }
    }
}
