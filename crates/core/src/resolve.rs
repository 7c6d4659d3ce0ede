//! Reference resolution: a validated index in, concrete geometry out.
//!
//! Every public function owns a fresh cycle-tracking trail, so unrelated
//! resolutions never contaminate each other; nested sub-resolutions within
//! one call share (a copy of) the caller's trail. Dangling names are
//! unreachable after successful validation but are still surfaced as typed
//! errors rather than panics.

use std::f64::consts::PI;

use serde::Serialize;
use thiserror::Error;

use crate::index::ResolvedIndex;
use crate::model::*;

/// A resolved 2-D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A path chain's heading with every reference evaluated, in radians.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConcreteHeading {
    Tangent,
    Constant { heading: f64 },
    Interpolated { headings: [f64; 2] },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("circular reference for {name} ({} cause the cycle)", .chain.join(", "))]
    Cycle { name: String, chain: Vec<String> },
    /// Only reachable when validation was skipped or is out of date.
    #[error("{kind} reference \"{name}\" is not defined")]
    Dangling { kind: &'static str, name: String },
    #[error("pose \"{name}\" has no heading")]
    MissingHeading { name: String },
}

fn cycle(name: &str, trail: &[String]) -> ResolveError {
    ResolveError::Cycle {
        name: name.to_owned(),
        chain: trail.to_vec(),
    }
}

fn dangling(kind: &'static str, name: &str) -> ResolveError {
    ResolveError::Dangling {
        kind,
        name: name.to_owned(),
    }
}

/// Resolve a scalar to its numeric value, following named bindings
/// transitively. A radians-bound name converts from degrees on the way out.
pub fn resolve_value(index: &ResolvedIndex, vr: &ValueRef) -> Result<f64, ResolveError> {
    value_with(index, vr, &[])
}

/// Resolve a pose reference to a 2-D point.
pub fn resolve_pose(index: &ResolvedIndex, pr: &PoseRef) -> Result<Point, ResolveError> {
    pose_with(index, pr, &[])
}

/// Resolve a bezier reference to its ordered control-point sequence.
pub fn resolve_bezier(index: &ResolvedIndex, br: &BezierRef) -> Result<Vec<Point>, ResolveError> {
    bezier_with(index, br, &[])
}

/// Resolve a heading to radians. Bare names try the value table first and
/// fall back to reusing a named pose's own heading.
pub fn resolve_heading(index: &ResolvedIndex, hr: &HeadingRef) -> Result<f64, ResolveError> {
    heading_with(index, hr, &[])
}

/// Resolve a pose reference to that pose's own heading, in radians.
pub fn resolve_pose_heading(index: &ResolvedIndex, pr: &PoseRef) -> Result<f64, ResolveError> {
    pose_heading_with(index, pr, &[])
}

/// Resolve a whole path chain: every bezier's point sequence plus the
/// fully-evaluated heading -- the complete input the rendering side needs.
pub fn resolve_chain(
    index: &ResolvedIndex,
    name: &str,
) -> Result<(Vec<Vec<Point>>, ConcreteHeading), ResolveError> {
    let chain = index
        .path_chains
        .get(name)
        .ok_or_else(|| dangling("path chain", name))?;
    let mut paths = Vec::with_capacity(chain.paths.len());
    for br in &chain.paths {
        paths.push(resolve_bezier(index, br)?);
    }
    let heading = match &chain.heading {
        HeadingType::Tangent => ConcreteHeading::Tangent,
        HeadingType::Constant { heading } => ConcreteHeading::Constant {
            heading: resolve_heading(index, heading)?,
        },
        HeadingType::Interpolated { headings } => ConcreteHeading::Interpolated {
            headings: [
                resolve_heading(index, &headings[0])?,
                resolve_heading(index, &headings[1])?,
            ],
        },
    };
    Ok((paths, heading))
}

// ── Trail-threaded internals ─────────────────────────────────────────
//
// Each function copies the incoming trail so sibling sub-resolutions (a
// pose's x and y, a bezier's points) don't see each other's visits, while
// a chain of nested lookups does.

fn value_with(index: &ResolvedIndex, vr: &ValueRef, trail: &[String]) -> Result<f64, ResolveError> {
    let mut trail = trail.to_vec();
    let mut cur = vr;
    loop {
        match cur {
            ValueRef::Value(av) => return Ok(av.as_f64()),
            ValueRef::Name(name) => {
                if trail.iter().any(|n| n == name) {
                    return Err(cycle(name, &trail));
                }
                trail.push(name.clone());
                match index.values.get(name) {
                    Some(ValueBinding::Scalar(inner)) => cur = inner,
                    Some(ValueBinding::Radians(r)) => {
                        return Ok(value_with(index, &r.radians, &trail)? * PI / 180.0);
                    }
                    None => return Err(dangling("value", name)),
                }
            }
        }
    }
}

fn pose_with(index: &ResolvedIndex, pr: &PoseRef, trail: &[String]) -> Result<Point, ResolveError> {
    let mut trail = trail.to_vec();
    let mut cur = pr;
    loop {
        match cur {
            PoseRef::Pose(pose) => {
                return Ok(Point {
                    x: value_with(index, &pose.x, &trail)?,
                    y: value_with(index, &pose.y, &trail)?,
                });
            }
            PoseRef::Name(name) => {
                if trail.iter().any(|n| n == name) {
                    return Err(cycle(name, &trail));
                }
                trail.push(name.clone());
                cur = index.poses.get(name).ok_or_else(|| dangling("pose", name))?;
            }
        }
    }
}

fn pose_heading_with(
    index: &ResolvedIndex,
    pr: &PoseRef,
    trail: &[String],
) -> Result<f64, ResolveError> {
    let mut trail = trail.to_vec();
    let mut cur = pr;
    let mut last_name = String::new();
    loop {
        match cur {
            PoseRef::Pose(pose) => {
                return match &pose.heading {
                    Some(heading) => heading_with(index, heading, &trail),
                    None => Err(ResolveError::MissingHeading { name: last_name }),
                };
            }
            PoseRef::Name(name) => {
                if trail.iter().any(|n| n == name) {
                    return Err(cycle(name, &trail));
                }
                trail.push(name.clone());
                last_name = name.clone();
                cur = index.poses.get(name).ok_or_else(|| dangling("pose", name))?;
            }
        }
    }
}

fn bezier_with(
    index: &ResolvedIndex,
    br: &BezierRef,
    trail: &[String],
) -> Result<Vec<Point>, ResolveError> {
    let mut trail = trail.to_vec();
    let mut cur = br;
    loop {
        match cur {
            BezierRef::Bezier(bezier) => {
                return bezier
                    .points
                    .iter()
                    .map(|p| pose_with(index, p, &trail))
                    .collect();
            }
            BezierRef::Name(name) => {
                if trail.iter().any(|n| n == name) {
                    return Err(cycle(name, &trail));
                }
                trail.push(name.clone());
                cur = index
                    .beziers
                    .get(name)
                    .ok_or_else(|| dangling("bezier", name))?;
            }
        }
    }
}

fn heading_with(
    index: &ResolvedIndex,
    hr: &HeadingRef,
    trail: &[String],
) -> Result<f64, ResolveError> {
    match hr {
        HeadingRef::Radians(r) => Ok(value_with(index, &r.radians, trail)? * PI / 180.0),
        // A bare literal is already in radians, the model's internal unit.
        HeadingRef::Ref(ValueRef::Value(av)) => Ok(av.as_f64()),
        HeadingRef::Ref(ValueRef::Name(name)) => {
            if index.values.contains_key(name) {
                value_with(index, &ValueRef::Name(name.clone()), trail)
            } else if index.poses.contains_key(name) {
                pose_heading_with(index, &PoseRef::Name(name.clone()), trail)
            } else {
                Err(dangling("heading", name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;

    fn lit_i(n: i64) -> ValueRef {
        ValueRef::Value(AnonymousValue::Int(n))
    }

    fn lit_d(d: f64) -> ValueRef {
        ValueRef::Value(AnonymousValue::Double(d))
    }

    fn name(n: &str) -> ValueRef {
        ValueRef::Name(n.into())
    }

    fn value(n: &str, binding: ValueBinding) -> NamedValue {
        NamedValue {
            name: n.into(),
            value: binding,
        }
    }

    #[test]
    fn literals_resolve_verbatim() {
        let index = build_index(&PathChainFile::empty());
        assert_eq!(resolve_value(&index, &lit_i(7)).unwrap(), 7.0);
        assert_eq!(resolve_value(&index, &lit_d(2.5)).unwrap(), 2.5);
    }

    #[test]
    fn named_chains_resolve_transitively() {
        let mut file = PathChainFile::new("t");
        file.values
            .push(value("a", ValueBinding::Scalar(name("b"))));
        file.values
            .push(value("b", ValueBinding::Scalar(lit_d(1.25))));
        let index = build_index(&file);
        assert_eq!(resolve_value(&index, &name("a")).unwrap(), 1.25);
    }

    #[test]
    fn cycle_detection_is_symmetric() {
        let mut file = PathChainFile::new("t");
        file.values
            .push(value("a", ValueBinding::Scalar(name("b"))));
        file.values
            .push(value("b", ValueBinding::Scalar(name("a"))));
        let index = build_index(&file);
        for start in ["a", "b"] {
            let err = resolve_value(&index, &name(start)).unwrap_err();
            match err {
                ResolveError::Cycle { chain, .. } => {
                    assert!(chain.contains(&"a".to_string()));
                    assert!(chain.contains(&"b".to_string()));
                }
                other => panic!("expected cycle, got {:?}", other),
            }
        }
    }

    #[test]
    fn sibling_resolutions_do_not_share_a_trail() {
        // x and y both reach "a"; that is reuse, not a cycle.
        let mut file = PathChainFile::new("t");
        file.values
            .push(value("a", ValueBinding::Scalar(lit_d(3.0))));
        file.poses.push(NamedPose {
            name: "p".into(),
            pose: AnonymousPose {
                x: name("a"),
                y: name("a"),
                heading: None,
            },
        });
        let index = build_index(&file);
        let point = resolve_pose(&index, &PoseRef::Name("p".into())).unwrap();
        assert_eq!(point, Point { x: 3.0, y: 3.0 });
    }

    #[test]
    fn degrees_convert_at_resolution_time() {
        let mut file = PathChainFile::new("t");
        file.values.push(value(
            "one80",
            ValueBinding::Radians(RadiansRef {
                radians: lit_i(180),
            }),
        ));
        let index = build_index(&file);
        let v = resolve_value(&index, &name("one80")).unwrap();
        assert!((v - PI).abs() < 1e-12);
        let h = resolve_heading(
            &index,
            &HeadingRef::Radians(RadiansRef { radians: lit_i(90) }),
        )
        .unwrap();
        assert!((h - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn bare_heading_literal_is_already_radians() {
        let index = build_index(&PathChainFile::empty());
        let h = resolve_heading(&index, &HeadingRef::Ref(lit_d(1.5708))).unwrap();
        assert_eq!(h, 1.5708);
    }

    #[test]
    fn end_to_end_pose_scenario() {
        let mut file = PathChainFile::new("t");
        file.values
            .push(value("val1", ValueBinding::Scalar(lit_i(1))));
        file.values
            .push(value("val2", ValueBinding::Scalar(lit_d(2.5))));
        file.poses.push(NamedPose {
            name: "pose1".into(),
            pose: AnonymousPose {
                x: lit_d(2.5),
                y: name("val1"),
                heading: None,
            },
        });
        let index = build_index(&file);
        let point = resolve_pose(&index, &PoseRef::Name("pose1".into())).unwrap();
        assert_eq!(point, Point { x: 2.5, y: 1.0 });

        let err = resolve_pose(&index, &PoseRef::Name("noPose".into())).unwrap_err();
        assert_eq!(
            err,
            ResolveError::Dangling {
                kind: "pose",
                name: "noPose".into(),
            }
        );
        assert!(err.to_string().contains("noPose"));
    }

    #[test]
    fn heading_name_reuses_a_pose_heading() {
        let mut file = PathChainFile::new("t");
        file.values.push(value(
            "ninety",
            ValueBinding::Radians(RadiansRef { radians: lit_i(90) }),
        ));
        file.poses.push(NamedPose {
            name: "target".into(),
            pose: AnonymousPose {
                x: lit_i(0),
                y: lit_i(0),
                heading: Some(HeadingRef::Ref(name("ninety"))),
            },
        });
        let index = build_index(&file);
        // "target" is a pose, so its own heading is resolved
        let h = resolve_heading(&index, &HeadingRef::Ref(name("target"))).unwrap();
        assert!((h - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn pose_without_heading_is_an_error_when_asked_for_one() {
        let mut file = PathChainFile::new("t");
        file.poses.push(NamedPose {
            name: "flat".into(),
            pose: AnonymousPose {
                x: lit_i(0),
                y: lit_i(0),
                heading: None,
            },
        });
        let index = build_index(&file);
        let err = resolve_pose_heading(&index, &PoseRef::Name("flat".into())).unwrap_err();
        assert_eq!(err, ResolveError::MissingHeading { name: "flat".into() });
    }

    #[test]
    fn bezier_resolution_orders_points() {
        let mut file = PathChainFile::new("t");
        file.poses.push(NamedPose {
            name: "p1".into(),
            pose: AnonymousPose {
                x: lit_i(0),
                y: lit_i(0),
                heading: None,
            },
        });
        file.beziers.push(NamedBezier {
            name: "seg".into(),
            points: AnonymousBezier {
                kind: BezierKind::Curve,
                points: vec![
                    PoseRef::Name("p1".into()),
                    PoseRef::Pose(AnonymousPose {
                        x: lit_i(1),
                        y: lit_i(2),
                        heading: None,
                    }),
                    PoseRef::Name("p1".into()),
                ],
            },
        });
        let index = build_index(&file);
        let points = resolve_bezier(&index, &BezierRef::Name("seg".into())).unwrap();
        assert_eq!(
            points,
            vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 1.0, y: 2.0 },
                Point { x: 0.0, y: 0.0 },
            ]
        );
    }

    #[test]
    fn chain_resolution_yields_geometry_and_concrete_heading() {
        let mut file = PathChainFile::new("t");
        file.poses.push(NamedPose {
            name: "p1".into(),
            pose: AnonymousPose {
                x: lit_i(0),
                y: lit_i(0),
                heading: None,
            },
        });
        file.poses.push(NamedPose {
            name: "p2".into(),
            pose: AnonymousPose {
                x: lit_i(4),
                y: lit_i(4),
                heading: None,
            },
        });
        file.beziers.push(NamedBezier {
            name: "seg".into(),
            points: AnonymousBezier {
                kind: BezierKind::Line,
                points: vec![PoseRef::Name("p1".into()), PoseRef::Name("p2".into())],
            },
        });
        file.path_chains.push(NamedPathChain {
            name: "chain1".into(),
            paths: vec![BezierRef::Name("seg".into())],
            heading: HeadingType::Interpolated {
                headings: [
                    HeadingRef::Radians(RadiansRef { radians: lit_i(0) }),
                    HeadingRef::Radians(RadiansRef {
                        radians: lit_i(180),
                    }),
                ],
            },
        });
        let index = build_index(&file);
        let (paths, heading) = resolve_chain(&index, "chain1").unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(
            paths[0],
            vec![Point { x: 0.0, y: 0.0 }, Point { x: 4.0, y: 4.0 }]
        );
        match heading {
            ConcreteHeading::Interpolated { headings } => {
                assert!((headings[0] - 0.0).abs() < 1e-12);
                assert!((headings[1] - PI).abs() < 1e-12);
            }
            other => panic!("expected interpolated heading, got {:?}", other),
        }
    }

    #[test]
    fn cycle_error_names_the_full_cycle() {
        let mut file = PathChainFile::new("t");
        file.values
            .push(value("a", ValueBinding::Scalar(name("b"))));
        file.values
            .push(value("b", ValueBinding::Scalar(name("c"))));
        file.values
            .push(value("c", ValueBinding::Scalar(name("a"))));
        let index = build_index(&file);
        let err = resolve_value(&index, &name("a")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("circular reference for a"));
        assert!(msg.contains('b'));
        assert!(msg.contains('c'));
    }
}
