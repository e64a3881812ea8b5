use std::fmt::Write;

use super::{file_stem, reflect, Node, Scalar, LOGICAL_NAME};
use crate::error::Result;
use crate::frame::{NamedFrame, PartSizes};
use crate::job::Job;
use crate::post::{PostOutput, PostProcessor};

/// The whole job as brace-nested `"key":value,` lines.
///
/// Every member keeps its trailing comma except the very last one of the
/// file, so the result is JSON-like rather than strict JSON.
pub struct JsonDumpPost;

impl PostProcessor for JsonDumpPost {
    fn name(&self) -> &str {
        "JSON dump"
    }

    fn file_extension(&self) -> &str {
        "json"
    }

    fn side_transforms(&self, _sizes: &PartSizes, _called_from_nesting: bool) -> Vec<NamedFrame> {
        Vec::new()
    }

    fn process(&self, job: &Job) -> Result<Vec<PostOutput>> {
        let tree = reflect(job)?;
        let mut content = String::new();
        write_object(&mut content, &tree, 0);
        if let Some(last_comma) = content.rfind(',') {
            content.truncate(last_comma);
        }
        Ok(vec![PostOutput {
            file_stem: file_stem(job),
            extension: self.file_extension().to_string(),
            logical_name: LOGICAL_NAME.to_string(),
            content,
        }])
    }
}

fn quote(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

fn write_object(out: &mut String, node: &Node, depth: usize) {
    let indent = "\t".repeat(depth);
    out.push_str("{\n");
    for (key, value) in &node.properties {
        let text = match value {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => Scalar::format_number(*n),
            Scalar::Text(s) => quote(s),
        };
        let _ = writeln!(out, "{}{}:{},", indent, quote(key), text);
    }
    for (key, value) in &node.enums {
        let _ = writeln!(out, "{}{}:{},", indent, quote(key), quote(value));
    }
    for child in &node.children {
        let _ = write!(out, "\n{}{}:", indent, quote(&child.key));
        write_object(out, child, depth + 1);
    }
    let _ = writeln!(out, "{}}},", "\t".repeat(depth.saturating_sub(1)));
}
