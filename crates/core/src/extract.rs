//! Declaration extraction: [`RawClass`] -> [`PathChainFile`].
//!
//! Each class member is tested against a small set of shapes; a member that
//! matches none of them is ordinary program logic and is skipped silently.
//! The shapes:
//!
//! 1. `public static int|double name = <scalar>;` -- a named value. The
//!    payload type follows the declared primitive. `Math.toRadians(x)`
//!    initializers bind the value to a degrees-marked scalar.
//! 2. `public static Pose name = new Pose(x, y[, heading]);` -- a named
//!    pose. `x` and `y` must be scalars; the heading accepts scalars,
//!    `Math.toRadians(x)`, and `<pose>.getHeading()`.
//! 3. `public static BezierLine|BezierCurve name = new <same>(p, ...);` --
//!    a named line (exactly 2 points) or curve (2 or more), each point a
//!    pose name or a nested `new Pose(...)`.
//! 4. `public PathChain name;` plus a constructor assignment
//!    `name = <follower>.pathBuilder().addPath(..)...build();` -- a named
//!    path chain. `setLinearHeadingInterpolation(a, b)`,
//!    `setConstantHeadingInterpolation(h)`, and
//!    `setTangentHeadingInterpolation()` select the heading; with no
//!    setter the chain follows the tangent.

use std::collections::HashSet;
use std::path::Path;

use crate::ast::{RawClass, RawExpr, RawField};
use crate::error::ExtractError;
use crate::lexer;
use crate::model::*;
use crate::parser;

/// Extract a path-definition document from one compilation unit's text.
pub fn extract_source(src: &str, filename: &str) -> Result<PathChainFile, ExtractError> {
    let tokens = lexer::lex(src, filename)?;
    let class = parser::parse_class(&tokens, filename)?;
    Ok(build_document(&class, filename))
}

/// Read a file and extract its document. The only filesystem touch in the
/// engine; an unreadable file is a single fatal error for the request.
pub fn extract_file(path: &Path) -> Result<PathChainFile, ExtractError> {
    let name = path.display().to_string();
    let src = std::fs::read_to_string(path)
        .map_err(|e| ExtractError::io(&name, format!("could not read file: {}", e)))?;
    extract_source(&src, &name)
}

fn build_document(class: &RawClass, filename: &str) -> PathChainFile {
    let mut file = PathChainFile::new(filename);
    let mut chain_fields: HashSet<String> = HashSet::new();

    for field in &class.fields {
        if let Some(nv) = try_named_value(field) {
            file.values.push(nv);
            continue;
        }
        if let Some(np) = try_named_pose(field) {
            file.poses.push(np);
            continue;
        }
        if let Some(nb) = try_named_bezier(field) {
            file.beziers.push(nb);
            continue;
        }
        if field.type_name == "PathChain" && field.is_public_instance() {
            chain_fields.insert(field.name.clone());
        }
    }

    for assign in &class.assigns {
        if !chain_fields.contains(&assign.name) {
            continue;
        }
        if let Some((paths, heading)) = match_chain(&assign.expr) {
            file.path_chains.push(NamedPathChain {
                name: assign.name.clone(),
                paths,
                heading,
            });
        }
    }

    file
}

// ── Shape 1: named value ─────────────────────────────────────────────

fn try_named_value(field: &RawField) -> Option<NamedValue> {
    if !field.is_public_static() {
        return None;
    }
    if field.type_name != "int" && field.type_name != "double" {
        return None;
    }
    let init = field.init.as_ref()?;
    let binding = match_value_binding(init)?;
    let binding = coerce_to_declared(binding, &field.type_name)?;
    Some(NamedValue {
        name: field.name.clone(),
        value: binding,
    })
}

/// Literal payloads take the declared primitive type: `double x = 72`
/// yields a double payload, and a float literal cannot initialize an `int`
/// field. References and radians wrappers pass through unchanged.
fn coerce_to_declared(binding: ValueBinding, declared: &str) -> Option<ValueBinding> {
    match (&binding, declared) {
        (ValueBinding::Scalar(ValueRef::Value(AnonymousValue::Int(n))), "double") => Some(
            ValueBinding::Scalar(ValueRef::Value(AnonymousValue::Double(*n as f64))),
        ),
        (ValueBinding::Scalar(ValueRef::Value(AnonymousValue::Double(_))), "int") => None,
        _ => Some(binding),
    }
}

// ── Shape 2: named pose ──────────────────────────────────────────────

fn try_named_pose(field: &RawField) -> Option<NamedPose> {
    if !field.is_public_static() || field.type_name != "Pose" {
        return None;
    }
    let pose = match_anonymous_pose(field.init.as_ref()?)?;
    Some(NamedPose {
        name: field.name.clone(),
        pose,
    })
}

// ── Shape 3: named bezier ────────────────────────────────────────────

fn try_named_bezier(field: &RawField) -> Option<NamedBezier> {
    if !field.is_public_static() {
        return None;
    }
    let declared = match field.type_name.as_str() {
        "BezierLine" => BezierKind::Line,
        "BezierCurve" => BezierKind::Curve,
        _ => return None,
    };
    let bezier = match_anonymous_bezier(field.init.as_ref()?)?;
    if bezier.kind != declared {
        return None;
    }
    Some(NamedBezier {
        name: field.name.clone(),
        points: bezier,
    })
}

// ── Shape 4: path chain ──────────────────────────────────────────────

fn match_chain(expr: &RawExpr) -> Option<(Vec<BezierRef>, HeadingType)> {
    // Unwind the builder chain from the outside in: the outermost call must
    // be `.build()`, the innermost `.pathBuilder()` on a plain identifier.
    let RawExpr::Invoke { recv, method, args } = expr else {
        return None;
    };
    if method != "build" || !args.is_empty() {
        return None;
    }

    let mut cur = recv.as_ref();
    let mut rev_paths: Vec<BezierRef> = Vec::new();
    // Unwinding visits setters in reverse source order, so the first one
    // seen is the last one written -- that one wins.
    let mut heading: Option<HeadingType> = None;

    loop {
        let RawExpr::Invoke { recv, method, args } = cur else {
            return None;
        };
        match (method.as_str(), args.len()) {
            ("addPath", 1) => {
                rev_paths.push(match_bezier_ref(&args[0])?);
            }
            ("setLinearHeadingInterpolation", 2) => {
                if heading.is_none() {
                    heading = Some(HeadingType::Interpolated {
                        headings: [match_heading_ref(&args[0])?, match_heading_ref(&args[1])?],
                    });
                }
            }
            ("setConstantHeadingInterpolation", 1) => {
                if heading.is_none() {
                    heading = Some(HeadingType::Constant {
                        heading: match_heading_ref(&args[0])?,
                    });
                }
            }
            ("setTangentHeadingInterpolation", 0) => {
                if heading.is_none() {
                    heading = Some(HeadingType::Tangent);
                }
            }
            ("pathBuilder", 0) => {
                if !matches!(recv.as_ref(), RawExpr::Ident(_)) {
                    return None;
                }
                break;
            }
            _ => return None,
        }
        cur = recv.as_ref();
    }

    if rev_paths.is_empty() {
        return None;
    }
    rev_paths.reverse();
    Some((rev_paths, heading.unwrap_or(HeadingType::Tangent)))
}

// ── The literal/reference matcher and its composites ─────────────────

/// The base matcher: a signed numeric literal or a bare identifier.
/// Everything else -- arithmetic, casts, unrecognized calls -- is no match.
fn match_value_ref(expr: &RawExpr) -> Option<ValueRef> {
    match expr {
        RawExpr::Int(n) => Some(ValueRef::Value(AnonymousValue::Int(*n))),
        RawExpr::Float(f) => Some(ValueRef::Value(AnonymousValue::Double(*f))),
        RawExpr::Ident(name) => Some(ValueRef::Name(name.clone())),
        _ => None,
    }
}

/// `Math.toRadians(<scalar>)`.
fn match_radians(expr: &RawExpr) -> Option<RadiansRef> {
    let RawExpr::Invoke { recv, method, args } = expr else {
        return None;
    };
    if method != "toRadians" || args.len() != 1 {
        return None;
    }
    match recv.as_ref() {
        RawExpr::Ident(cls) if cls == "Math" => Some(RadiansRef {
            radians: match_value_ref(&args[0])?,
        }),
        _ => None,
    }
}

fn match_value_binding(expr: &RawExpr) -> Option<ValueBinding> {
    if let Some(radians) = match_radians(expr) {
        return Some(ValueBinding::Radians(radians));
    }
    match_value_ref(expr).map(ValueBinding::Scalar)
}

/// Scalars, `Math.toRadians(x)`, or `<pose>.getHeading()` (which reuses the
/// named pose's own heading).
fn match_heading_ref(expr: &RawExpr) -> Option<HeadingRef> {
    if let Some(radians) = match_radians(expr) {
        return Some(HeadingRef::Radians(radians));
    }
    if let RawExpr::Invoke { recv, method, args } = expr {
        if method == "getHeading" && args.is_empty() {
            if let RawExpr::Ident(name) = recv.as_ref() {
                return Some(HeadingRef::Ref(ValueRef::Name(name.clone())));
            }
        }
        return None;
    }
    match_value_ref(expr).map(HeadingRef::Ref)
}

/// `new Pose(x, y)` or `new Pose(x, y, heading)`. Coordinates must be
/// scalars -- a nested pose in a coordinate position is not accepted.
fn match_anonymous_pose(expr: &RawExpr) -> Option<AnonymousPose> {
    let RawExpr::New { class, args } = expr else {
        return None;
    };
    if class != "Pose" || !(args.len() == 2 || args.len() == 3) {
        return None;
    }
    let x = match_value_ref(&args[0])?;
    let y = match_value_ref(&args[1])?;
    let heading = match args.get(2) {
        Some(h) => Some(match_heading_ref(h)?),
        None => None,
    };
    Some(AnonymousPose { x, y, heading })
}

fn match_pose_ref(expr: &RawExpr) -> Option<PoseRef> {
    match expr {
        RawExpr::Ident(name) => Some(PoseRef::Name(name.clone())),
        _ => match_anonymous_pose(expr).map(PoseRef::Pose),
    }
}

/// `new BezierLine(p1, p2)` / `new BezierCurve(p1, ..., pn)` with the
/// arity rules applied at match time.
fn match_anonymous_bezier(expr: &RawExpr) -> Option<AnonymousBezier> {
    let RawExpr::New { class, args } = expr else {
        return None;
    };
    let kind = match class.as_str() {
        "BezierLine" => BezierKind::Line,
        "BezierCurve" => BezierKind::Curve,
        _ => return None,
    };
    match kind {
        BezierKind::Line if args.len() != 2 => return None,
        BezierKind::Curve if args.len() < 2 => return None,
        _ => {}
    }
    let points = args
        .iter()
        .map(match_pose_ref)
        .collect::<Option<Vec<_>>>()?;
    Some(AnonymousBezier { kind, points })
}

fn match_bezier_ref(expr: &RawExpr) -> Option<BezierRef> {
    match expr {
        RawExpr::Ident(name) => Some(BezierRef::Name(name.clone())),
        _ => match_anonymous_bezier(expr).map(BezierRef::Bezier),
    }
}
