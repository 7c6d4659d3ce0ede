//! The path-definition document model.
//!
//! A [`PathChainFile`] is the extracted, still-unvalidated model of one
//! source file's path-relevant declarations: named values, poses, bezier
//! lines/curves, and path chains, each in declaration order. Documents are
//! immutable once built; edits happen in the source file, never here.
//!
//! Serialization mirrors the transport format field for field: anonymous
//! values are externally tagged (`{"int": 80}`, `{"double": 72.0}`),
//! references are untagged (a bare string is a name), radians wrappers are
//! `{"radians": <ref>}`, and headings are `"type"`-tagged objects.

use serde::Serialize;

pub type ValueName = String;
pub type PoseName = String;
pub type BezierName = String;
pub type PathChainName = String;

/// An inline numeric literal. The payload type records the lexical form it
/// had in the source (`72` vs `72.0`), not a unified float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AnonymousValue {
    #[serde(rename = "int")]
    Int(i64),
    #[serde(rename = "double")]
    Double(f64),
}

impl AnonymousValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            AnonymousValue::Int(n) => *n as f64,
            AnonymousValue::Double(d) => *d,
        }
    }
}

/// A scalar expression: an inline literal or a reference to a named value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValueRef {
    Value(AnonymousValue),
    Name(ValueName),
}

/// Marks a scalar as declared in degrees; evaluation multiplies by pi/180.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadiansRef {
    pub radians: ValueRef,
}

/// What a named value is bound to: a scalar (literal or reference), or a
/// degrees-marked scalar (`Math.toRadians(...)` initializers).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValueBinding {
    Scalar(ValueRef),
    Radians(RadiansRef),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    pub name: ValueName,
    pub value: ValueBinding,
}

/// A heading expression. The name inside the `Ref` arm may denote a named
/// value or a pose (whose own heading is then reused); the two tables are
/// disambiguated at validation/resolution time, which is safe only because
/// names are globally unique across categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HeadingRef {
    Radians(RadiansRef),
    Ref(ValueRef),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnonymousPose {
    pub x: ValueRef,
    pub y: ValueRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<HeadingRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PoseRef {
    Pose(AnonymousPose),
    Name(PoseName),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedPose {
    pub name: PoseName,
    pub pose: AnonymousPose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BezierKind {
    Line,
    Curve,
}

/// A line (exactly 2 control points) or curve (2 or more).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnonymousBezier {
    #[serde(rename = "type")]
    pub kind: BezierKind,
    pub points: Vec<PoseRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BezierRef {
    Bezier(AnonymousBezier),
    Name(BezierName),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedBezier {
    pub name: BezierName,
    pub points: AnonymousBezier,
}

/// How a path chain orients the robot along its beziers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HeadingType {
    /// Follow the tangent of the path
    Tangent,
    /// Hold one heading for the whole chain
    Constant { heading: HeadingRef },
    /// Interpolate from a start heading to an end heading
    Interpolated { headings: [HeadingRef; 2] },
}

/// A path chain has no anonymous form; it only exists named.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedPathChain {
    pub name: PathChainName,
    pub paths: Vec<BezierRef>,
    pub heading: HeadingType,
}

/// The extracted model of one source file, in declaration order per
/// category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathChainFile {
    pub name: String,
    pub values: Vec<NamedValue>,
    pub poses: Vec<NamedPose>,
    pub beziers: Vec<NamedBezier>,
    #[serde(rename = "pathChains")]
    pub path_chains: Vec<NamedPathChain>,
}

impl PathChainFile {
    pub fn new(name: &str) -> Self {
        PathChainFile {
            name: name.to_owned(),
            values: Vec::new(),
            poses: Vec::new(),
            beziers: Vec::new(),
            path_chains: Vec::new(),
        }
    }

    /// The data-less fallback document callers substitute for a rejected or
    /// absent one.
    pub fn empty() -> Self {
        PathChainFile::new("empty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_payloads_are_externally_tagged() {
        assert_eq!(
            serde_json::to_value(AnonymousValue::Int(80)).unwrap(),
            json!({"int": 80})
        );
        assert_eq!(
            serde_json::to_value(AnonymousValue::Double(72.0)).unwrap(),
            json!({"double": 72.0})
        );
    }

    #[test]
    fn refs_serialize_untagged() {
        assert_eq!(
            serde_json::to_value(ValueRef::Name("org".into())).unwrap(),
            json!("org")
        );
        assert_eq!(
            serde_json::to_value(ValueBinding::Radians(RadiansRef {
                radians: ValueRef::Value(AnonymousValue::Int(180)),
            }))
            .unwrap(),
            json!({"radians": {"int": 180}})
        );
    }

    #[test]
    fn pose_omits_missing_heading() {
        let pose = AnonymousPose {
            x: ValueRef::Name("a".into()),
            y: ValueRef::Value(AnonymousValue::Double(1.5)),
            heading: None,
        };
        assert_eq!(
            serde_json::to_value(&pose).unwrap(),
            json!({"x": "a", "y": {"double": 1.5}})
        );
    }

    #[test]
    fn heading_types_are_type_tagged() {
        assert_eq!(
            serde_json::to_value(HeadingType::Tangent).unwrap(),
            json!({"type": "tangent"})
        );
        let interp = HeadingType::Interpolated {
            headings: [
                HeadingRef::Ref(ValueRef::Name("start".into())),
                HeadingRef::Radians(RadiansRef {
                    radians: ValueRef::Name("ninety".into()),
                }),
            ],
        };
        assert_eq!(
            serde_json::to_value(&interp).unwrap(),
            json!({
                "type": "interpolated",
                "headings": ["start", {"radians": "ninety"}],
            })
        );
    }

    #[test]
    fn file_uses_wire_field_names() {
        let file = PathChainFile::empty();
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            json!({
                "name": "empty",
                "values": [],
                "poses": [],
                "beziers": [],
                "pathChains": [],
            })
        );
    }
}
