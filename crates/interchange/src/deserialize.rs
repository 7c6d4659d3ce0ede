//! Value-walking deserialization with structural checking.

use std::fmt;

use pathchain_core::model::*;
use serde_json::Value;

/// Errors during document deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The document is missing a required top-level field.
    MissingField { field: String },
    /// A named entry is malformed.
    EntryError {
        category: &'static str,
        name: String,
        message: String,
    },
    /// The document structure is invalid.
    InvalidDocument(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::MissingField { field } => {
                write!(f, "document missing required field: '{}'", field)
            }
            DocumentError::EntryError {
                category,
                name,
                message,
            } => {
                write!(f, "{} '{}': {}", category, name, message)
            }
            DocumentError::InvalidDocument(msg) => {
                write!(f, "invalid document: {}", msg)
            }
        }
    }
}

impl std::error::Error for DocumentError {}

fn entry_err(category: &'static str, name: &str, message: impl Into<String>) -> DocumentError {
    DocumentError::EntryError {
        category,
        name: name.to_owned(),
        message: message.into(),
    }
}

/// Deserialize one document from interchange JSON, checking every shape.
pub fn from_document(doc: &Value) -> Result<PathChainFile, DocumentError> {
    let name = doc
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DocumentError::MissingField {
            field: "name".to_string(),
        })?
        .to_string();

    let mut file = PathChainFile::new(&name);

    for entry in required_array(doc, "values")? {
        file.values.push(parse_named_value(entry)?);
    }
    for entry in required_array(doc, "poses")? {
        file.poses.push(parse_named_pose(entry)?);
    }
    for entry in required_array(doc, "beziers")? {
        file.beziers.push(parse_named_bezier(entry)?);
    }
    for entry in required_array(doc, "pathChains")? {
        file.path_chains.push(parse_named_chain(entry)?);
    }

    Ok(file)
}

// ── Parsing helpers ─────────────────────────────────────────────────

fn required_array<'a>(doc: &'a Value, field: &str) -> Result<&'a Vec<Value>, DocumentError> {
    doc.get(field)
        .and_then(|v| v.as_array())
        .ok_or_else(|| DocumentError::MissingField {
            field: field.to_string(),
        })
}

fn entry_name(obj: &Value, category: &'static str) -> Result<String, DocumentError> {
    obj.get("name")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            DocumentError::InvalidDocument(format!("{} entry missing 'name' field", category))
        })
}

/// `{"int": n}` or `{"double": x}` -- exactly one key, correctly typed.
fn parse_anonymous_value(v: &Value) -> Option<AnonymousValue> {
    let obj = v.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    if let Some(n) = obj.get("int") {
        return n.as_i64().map(AnonymousValue::Int);
    }
    if let Some(d) = obj.get("double") {
        return d.as_f64().map(AnonymousValue::Double);
    }
    None
}

/// A bare string (a name) or an anonymous value.
fn parse_value_ref(v: &Value) -> Option<ValueRef> {
    if let Some(s) = v.as_str() {
        return Some(ValueRef::Name(s.to_string()));
    }
    parse_anonymous_value(v).map(ValueRef::Value)
}

/// `{"radians": <value ref>}`.
fn parse_radians(v: &Value) -> Option<RadiansRef> {
    let obj = v.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    let inner = obj.get("radians")?;
    Some(RadiansRef {
        radians: parse_value_ref(inner)?,
    })
}

fn parse_binding(v: &Value) -> Option<ValueBinding> {
    if let Some(r) = parse_radians(v) {
        return Some(ValueBinding::Radians(r));
    }
    parse_value_ref(v).map(ValueBinding::Scalar)
}

fn parse_heading_ref(v: &Value) -> Option<HeadingRef> {
    if let Some(r) = parse_radians(v) {
        return Some(HeadingRef::Radians(r));
    }
    parse_value_ref(v).map(HeadingRef::Ref)
}

/// `{"x": <ref>, "y": <ref>}` with an optional `"heading"` and no other
/// keys.
fn parse_pose(v: &Value) -> Option<AnonymousPose> {
    let obj = v.as_object()?;
    let heading = match obj.get("heading") {
        Some(h) => Some(parse_heading_ref(h)?),
        None => None,
    };
    let expected_len = if heading.is_some() { 3 } else { 2 };
    if obj.len() != expected_len {
        return None;
    }
    Some(AnonymousPose {
        x: parse_value_ref(obj.get("x")?)?,
        y: parse_value_ref(obj.get("y")?)?,
        heading,
    })
}

fn parse_pose_ref(v: &Value) -> Option<PoseRef> {
    if let Some(s) = v.as_str() {
        return Some(PoseRef::Name(s.to_string()));
    }
    parse_pose(v).map(PoseRef::Pose)
}

/// `{"type": "line"|"curve", "points": [<pose ref>...]}`.
fn parse_bezier(v: &Value) -> Option<AnonymousBezier> {
    let obj = v.as_object()?;
    if obj.len() != 2 {
        return None;
    }
    let kind = match obj.get("type")?.as_str()? {
        "line" => BezierKind::Line,
        "curve" => BezierKind::Curve,
        _ => return None,
    };
    let points = obj
        .get("points")?
        .as_array()?
        .iter()
        .map(parse_pose_ref)
        .collect::<Option<Vec<_>>>()?;
    Some(AnonymousBezier { kind, points })
}

fn parse_bezier_ref(v: &Value) -> Option<BezierRef> {
    if let Some(s) = v.as_str() {
        return Some(BezierRef::Name(s.to_string()));
    }
    parse_bezier(v).map(BezierRef::Bezier)
}

fn parse_heading_type(v: &Value) -> Option<HeadingType> {
    let obj = v.as_object()?;
    match obj.get("type")?.as_str()? {
        "tangent" => {
            if obj.len() != 1 {
                return None;
            }
            Some(HeadingType::Tangent)
        }
        "constant" => {
            if obj.len() != 2 {
                return None;
            }
            Some(HeadingType::Constant {
                heading: parse_heading_ref(obj.get("heading")?)?,
            })
        }
        "interpolated" => {
            if obj.len() != 2 {
                return None;
            }
            let arr = obj.get("headings")?.as_array()?;
            if arr.len() != 2 {
                return None;
            }
            Some(HeadingType::Interpolated {
                headings: [parse_heading_ref(&arr[0])?, parse_heading_ref(&arr[1])?],
            })
        }
        _ => None,
    }
}

// ── Named entries ───────────────────────────────────────────────────

fn check_entry_keys(
    obj: &Value,
    category: &'static str,
    name: &str,
    expected: usize,
) -> Result<(), DocumentError> {
    match obj.as_object() {
        Some(map) if map.len() == expected => Ok(()),
        _ => Err(entry_err(category, name, "unexpected fields on entry")),
    }
}

fn parse_named_value(obj: &Value) -> Result<NamedValue, DocumentError> {
    let name = entry_name(obj, "value")?;
    check_entry_keys(obj, "value", &name, 2)?;
    let value = obj
        .get("value")
        .and_then(parse_binding)
        .ok_or_else(|| entry_err("value", &name, "missing or malformed 'value' payload"))?;
    Ok(NamedValue { name, value })
}

fn parse_named_pose(obj: &Value) -> Result<NamedPose, DocumentError> {
    let name = entry_name(obj, "pose")?;
    check_entry_keys(obj, "pose", &name, 2)?;
    let pose = obj
        .get("pose")
        .and_then(parse_pose)
        .ok_or_else(|| entry_err("pose", &name, "missing or malformed 'pose' payload"))?;
    Ok(NamedPose { name, pose })
}

fn parse_named_bezier(obj: &Value) -> Result<NamedBezier, DocumentError> {
    let name = entry_name(obj, "bezier")?;
    check_entry_keys(obj, "bezier", &name, 2)?;
    let points = obj
        .get("points")
        .and_then(parse_bezier)
        .ok_or_else(|| entry_err("bezier", &name, "missing or malformed 'points' payload"))?;
    Ok(NamedBezier { name, points })
}

fn parse_named_chain(obj: &Value) -> Result<NamedPathChain, DocumentError> {
    let name = entry_name(obj, "path chain")?;
    check_entry_keys(obj, "path chain", &name, 3)?;
    let paths = obj
        .get("paths")
        .and_then(|v| v.as_array())
        .ok_or_else(|| entry_err("path chain", &name, "missing 'paths' array"))?
        .iter()
        .map(parse_bezier_ref)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| entry_err("path chain", &name, "malformed bezier reference in 'paths'"))?;
    let heading = obj
        .get("heading")
        .and_then(parse_heading_type)
        .ok_or_else(|| entry_err("path chain", &name, "missing or malformed 'heading'"))?;
    Ok(NamedPathChain {
        name,
        paths,
        heading,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_the_engine_serialization() {
        let mut file = PathChainFile::new("Paths.java");
        file.values.push(NamedValue {
            name: "org".into(),
            value: ValueBinding::Scalar(ValueRef::Value(AnonymousValue::Double(72.0))),
        });
        file.values.push(NamedValue {
            name: "one80".into(),
            value: ValueBinding::Radians(RadiansRef {
                radians: ValueRef::Value(AnonymousValue::Int(180)),
            }),
        });
        file.poses.push(NamedPose {
            name: "start".into(),
            pose: AnonymousPose {
                x: ValueRef::Name("org".into()),
                y: ValueRef::Name("org".into()),
                heading: Some(HeadingRef::Ref(ValueRef::Value(AnonymousValue::Int(0)))),
            },
        });
        file.beziers.push(NamedBezier {
            name: "seg".into(),
            points: AnonymousBezier {
                kind: BezierKind::Line,
                points: vec![PoseRef::Name("start".into()), PoseRef::Name("start".into())],
            },
        });
        file.path_chains.push(NamedPathChain {
            name: "Path1".into(),
            paths: vec![BezierRef::Name("seg".into())],
            heading: HeadingType::Interpolated {
                headings: [
                    HeadingRef::Radians(RadiansRef {
                        radians: ValueRef::Value(AnonymousValue::Int(90)),
                    }),
                    HeadingRef::Ref(ValueRef::Name("one80".into())),
                ],
            },
        });

        let wire = serde_json::to_value(&file).unwrap();
        let back = from_document(&wire).unwrap();
        assert_eq!(back, file);
    }

    #[test]
    fn missing_top_level_fields_are_rejected() {
        let err = from_document(&json!({"name": "x"})).unwrap_err();
        assert_eq!(
            err,
            DocumentError::MissingField {
                field: "values".into(),
            }
        );
        let err = from_document(&json!({})).unwrap_err();
        assert_eq!(
            err,
            DocumentError::MissingField {
                field: "name".into(),
            }
        );
    }

    #[test]
    fn wrong_payload_tags_are_rejected() {
        let doc = json!({
            "name": "x",
            "values": [{"name": "a", "value": {"float": 1.5}}],
            "poses": [], "beziers": [], "pathChains": [],
        });
        let err = from_document(&doc).unwrap_err();
        assert_eq!(
            err,
            DocumentError::EntryError {
                category: "value",
                name: "a".into(),
                message: "missing or malformed 'value' payload".into(),
            }
        );
    }

    #[test]
    fn int_payload_must_be_an_integer() {
        let doc = json!({
            "name": "x",
            "values": [{"name": "a", "value": {"int": 1.5}}],
            "poses": [], "beziers": [], "pathChains": [],
        });
        assert!(from_document(&doc).is_err());
    }

    #[test]
    fn extra_keys_on_a_pose_are_rejected() {
        let doc = json!({
            "name": "x",
            "values": [],
            "poses": [{"name": "p", "pose": {"x": {"int": 0}, "y": {"int": 0}, "dumb": 1}}],
            "beziers": [], "pathChains": [],
        });
        assert!(from_document(&doc).is_err());
    }

    #[test]
    fn unknown_heading_type_is_rejected() {
        let doc = json!({
            "name": "x",
            "values": [], "poses": [], "beziers": [],
            "pathChains": [{
                "name": "c",
                "paths": ["seg"],
                "heading": {"type": "wobbly"},
            }],
        });
        let err = from_document(&doc).unwrap_err();
        assert!(err.to_string().contains("malformed 'heading'"));
    }

    #[test]
    fn extra_keys_on_a_named_entry_are_rejected() {
        let doc = json!({
            "name": "x",
            "values": [{"name": "a", "value": {"int": 1}, "dumb": 1}],
            "poses": [], "beziers": [], "pathChains": [],
        });
        let err = from_document(&doc).unwrap_err();
        assert!(err.to_string().contains("unexpected fields"));
    }

    #[test]
    fn nested_radians_is_not_an_anonymous_value() {
        // {"radians": {"radians": ...}} is invalid: the wrapper holds a
        // plain scalar, not another wrapper
        let doc = json!({
            "name": "x",
            "values": [{"name": "a", "value": {"radians": {"radians": {"int": 1}}}}],
            "poses": [], "beziers": [], "pathChains": [],
        });
        assert!(from_document(&doc).is_err());
    }
}
