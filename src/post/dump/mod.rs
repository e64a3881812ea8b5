//! Full job dumps
//!
//! Both dump formats walk the same reflected tree. The job is serialized to
//! a [`serde_json::Value`] and every object is split into scalar properties,
//! enumerations and child objects. Lists become collection nodes with a
//! `Count` property and one child per element.

use serde_json::Value;

use crate::emitter::NumberFormat;
use crate::error::Result;
use crate::job::Job;

mod json;
mod xml;

pub use json::JsonDumpPost;
pub use xml::XmlDumpPost;

/// Logical name shared by both dump outputs.
pub const LOGICAL_NAME: &str = "allClamps";

/// Properties whose value is an enumeration of the host object model.
const ENUM_KEYS: &[&str] = &[
    "ClampingCorner",
    "ClampingBodyType",
    "RotationDirection",
    "ToolIdentifiedBy",
    "OffsetType",
    "OperationType",
    "TrajectoryType",
    "OffsetSide",
    "GeometryType",
    "LeadType",
    "ContourGeometryType",
    "CoverType",
    "SawInitialPosition",
];

/// Marker of ordering-significant collections, which are never sorted.
const ORDERED_MARKER: &str = "InclinedPlane";

/// Scalar value of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Whole numbers print without decimals, others with up to five.
    pub fn format_number(value: f64) -> String {
        if value.fract() == 0.0 {
            NumberFormat::new(0).trim().format(value)
        } else {
            NumberFormat::new(5).trim().format(value)
        }
    }
}

/// One object of the reflected job tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Property name in the parent, or the element index inside a collection.
    pub key: String,
    /// Element name, qualified by the collection or the type tag.
    pub name: String,
    pub properties: Vec<(String, Scalar)>,
    /// Enumerations with their resolved names.
    pub enums: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Reflect the whole job, rooted at `Job`.
pub fn reflect(job: &Job) -> Result<Node> {
    let value = serde_json::to_value(job)?;
    Ok(reflect_value("Job", "Job", &value))
}

/// `FullDumpFor<part code of the first clamping>`.
pub fn file_stem(job: &Job) -> String {
    let code = job.clampings.first().map(|c| c.part.code.as_str()).unwrap_or_default();
    format!("FullDumpFor{}", code)
}

fn reflect_value(key: &str, name: &str, value: &Value) -> Node {
    let mut node = Node {
        key: key.to_string(),
        name: name.to_string(),
        properties: Vec::new(),
        enums: Vec::new(),
        children: Vec::new(),
    };

    match value {
        Value::Object(map) => {
            for (k, v) in map {
                match v {
                    Value::Null => {}
                    Value::Bool(b) => node.properties.push((k.clone(), Scalar::Bool(*b))),
                    Value::Number(n) => node.properties.push((k.clone(), Scalar::Number(n.as_f64().unwrap_or_default()))),
                    Value::String(s) => match resolve_enum(k, s) {
                        Some(resolved) => node.enums.push((k.clone(), resolved)),
                        None => node.properties.push((k.clone(), Scalar::Text(s.clone()))),
                    },
                    Value::Object(_) | Value::Array(_) => node.children.push(reflect_value(k, k, v)),
                }
            }
            node.properties.retain(|(k, _)| k != "IsReadOnly");
            node.properties.sort_by(|a, b| a.0.cmp(&b.0));
            node.enums.sort_by(|a, b| a.0.cmp(&b.0));
            let ordered = map.values().find(|v| v.is_object() || v.is_array()).is_some_and(carries_marker);
            if !ordered {
                node.children.sort_by(|a, b| a.key.cmp(&b.key));
            }
        }
        Value::Array(items) => {
            node.properties.push(("Count".to_string(), Scalar::Number(items.len() as f64)));
            for (index, item) in items.iter().enumerate() {
                let element = element_name(name, item).unwrap_or_else(|| index.to_string());
                node.children.push(reflect_value(&index.to_string(), &element, item));
            }
            if !items.first().is_some_and(carries_marker) {
                node.children.sort_by(|a, b| a.key.cmp(&b.key));
            }
        }
        _ => {}
    }
    node
}

fn carries_marker(value: &Value) -> bool {
    value.get(ORDERED_MARKER).is_some()
}

/// Element name of a collection member.
fn element_name(collection: &str, item: &Value) -> Option<String> {
    let by_collection = match collection {
        "Clampings" => Some("Clamping"),
        "Sides" => Some("Side"),
        "MiddleRemovalContours" | "FinishContours" => Some("PockContour"),
        "PrimaryContours" => Some("PrimaryContour"),
        "Covers" => Some("Cover"),
        _ => None,
    };
    if let Some(name) = by_collection {
        return Some(name.to_string());
    }

    let tag = |key: &str| item.get(key).and_then(Value::as_str);
    if let Some(op) = tag("OperationType") {
        let name = match op {
            "PocketOperation" => "PockOperation",
            "NestingOperation" => "NestOperation",
            "CalibrationOperation" => "MillCalibrationOperation",
            "DrillOperation" | "MillOperation" | "CutOperation" | "GrooveOperation" | "CutCalibrationOperation"
            | "MacroOperation" => op,
            _ => "UnknownOperation",
        };
        return Some(name.to_string());
    }
    if let Some(trajectory) = tag("TrajectoryType") {
        let name = match trajectory {
            "PocketTrajectory" => "PockTrajectory",
            "CalibrationTrajectory" => "MillCalibrationTrajectory",
            "DrillTrajectory" | "MillTrajectory" | "CutTrajectory" | "GrooveTrajectory" | "NestingTrajectory"
            | "CutCalibrationTrajectory" | "MacroTrajectory" => trajectory,
            _ => "UnknownTrajectory",
        };
        return Some(name.to_string());
    }
    if let Some(geometry) = tag("GeometryType") {
        let name = match geometry {
            "Point" | "Segment" | "Arc" => geometry,
            _ => "UnknownGeometry",
        };
        return Some(name.to_string());
    }
    None
}

/// Printed name of an enumeration value, `None` when `key` is no enum.
pub fn resolve_enum(key: &str, value: &str) -> Option<String> {
    if !ENUM_KEYS.contains(&key) {
        return None;
    }
    let resolved = match (key, value) {
        ("OperationType", "PocketOperation") => "PockOperation",
        ("OperationType", "CalibrationOperation") => "MillCalibrationOperation",
        ("TrajectoryType", "PocketTrajectory") => "PockTrajectory",
        ("TrajectoryType", "CalibrationTrajectory") => "MillCalibrationTrajectory",
        ("SawInitialPosition", _) => "",
        (_, "") => "Unknown",
        (_, other) => other,
    };
    Some(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_job() -> Job {
        Job::from_json_str(
            r#"{
            "Clampings": [{
                "Name": "C1",
                "Part": { "Code": "P7", "Length": 60 },
                "Sides": [{ "Name": "Top" }, { "Name": "Front", "Zaxis": { "X": 0, "Y": -1, "Z": 0 } }],
                "Operations": [{
                    "Name": "Pocket", "Side": "Top", "OperationType": "PocketOperation",
                    "Trajectories": [{ "TrajectoryType": "PocketTrajectory", "FinishContours": [{}] }]
                }]
            }]
        }"#,
        )
        .unwrap()
    }

    fn child<'a>(node: &'a Node, key: &str) -> &'a Node {
        node.children.iter().find(|c| c.key == key).unwrap()
    }

    #[test]
    fn test_reflect_names_collection_elements() {
        let job = reflect(&sample_job()).unwrap();
        assert_eq!(job.name, "Job");

        let clampings = child(&job, "Clampings");
        assert_eq!(clampings.properties, vec![("Count".to_string(), Scalar::Number(1.0))]);
        let clamping = child(clampings, "0");
        assert_eq!(clamping.name, "Clamping");
        assert!(clamping.enums.contains(&("ClampingCorner".to_string(), "FrontLeft".to_string())));

        let op = child(child(clamping, "Operations"), "0");
        assert_eq!(op.name, "PockOperation");
        assert!(op.enums.contains(&("OperationType".to_string(), "PockOperation".to_string())));

        let trajectory = child(child(op, "Trajectories"), "0");
        assert_eq!(trajectory.name, "PockTrajectory");
        assert_eq!(child(child(trajectory, "FinishContours"), "0").name, "PockContour");
    }

    #[test]
    fn test_properties_and_children_sorted() {
        let job = reflect(&sample_job()).unwrap();
        let clamping = child(child(&job, "Clampings"), "0");
        let keys: Vec<&str> = clamping.children.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["Operations", "Part", "Sides"]);

        let part = child(clamping, "Part");
        let props: Vec<&str> = part.properties.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(props, vec!["Code", "Length", "Name", "Thickness", "Width"]);
    }

    #[test]
    fn test_marked_collections_keep_their_order() {
        let sides: Vec<Value> = (0..11).map(|i| json!({ "InclinedPlane": false, "Name": format!("S{}", i) })).collect();
        let node = reflect_value("Sides", "Sides", &Value::Array(sides));
        assert_eq!(node.children[2].key, "2");
        assert_eq!(node.children[10].key, "10");

        let points: Vec<Value> = (0..11).map(|i| json!({ "GeometryType": "Point", "X": i })).collect();
        let node = reflect_value("Geometry", "Geometry", &Value::Array(points));
        assert_eq!(node.children[2].key, "10");
        assert_eq!(node.children[2].name, "Point");
    }

    #[test]
    fn test_enum_resolution() {
        assert_eq!(resolve_enum("LeadType", "Ramp").as_deref(), Some("Ramp"));
        assert_eq!(resolve_enum("LeadType", "Unknown").as_deref(), Some("Unknown"));
        assert_eq!(resolve_enum("TrajectoryType", "CalibrationTrajectory").as_deref(), Some("MillCalibrationTrajectory"));
        assert_eq!(resolve_enum("Name", "Top"), None);
    }

    #[test]
    fn test_number_format() {
        assert_eq!(Scalar::format_number(60.0), "60");
        assert_eq!(Scalar::format_number(1.25), "1.25");
        assert_eq!(Scalar::format_number(1.0 / 3.0), "0.33333");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(&sample_job()), "FullDumpForP7");
        assert_eq!(file_stem(&Job::default()), "FullDumpFor");
    }
}
