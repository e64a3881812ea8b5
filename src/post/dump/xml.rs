use std::fmt::Write;

use super::{file_stem, reflect, Node, Scalar, LOGICAL_NAME};
use crate::error::Result;
use crate::frame::{NamedFrame, PartSizes};
use crate::job::Job;
use crate::post::{PostOutput, PostProcessor};

const HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// The whole job as nested XML elements, one tab per level.
pub struct XmlDumpPost;

impl PostProcessor for XmlDumpPost {
    fn name(&self) -> &str {
        "XML dump"
    }

    fn file_extension(&self) -> &str {
        "xml"
    }

    fn side_transforms(&self, _sizes: &PartSizes, _called_from_nesting: bool) -> Vec<NamedFrame> {
        Vec::new()
    }

    fn process(&self, job: &Job) -> Result<Vec<PostOutput>> {
        let tree = reflect(job)?;
        let mut content = String::from(HEADER);
        write_node(&mut content, &tree, 0);
        Ok(vec![PostOutput {
            file_stem: file_stem(job),
            extension: self.file_extension().to_string(),
            logical_name: LOGICAL_NAME.to_string(),
            content,
        }])
    }
}

fn write_node(out: &mut String, node: &Node, level: usize) {
    let indent = "\t".repeat(level);
    let _ = write!(out, "{}<{}", indent, node.name);
    for (key, value) in &node.enums {
        let _ = write!(out, " {}=\"{}\"", key, escape(value));
    }
    for (key, value) in &node.properties {
        let text = match value {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => Scalar::format_number(*n),
            Scalar::Text(s) => escape(s),
        };
        let _ = write!(out, " {}=\"{}\"", key, text);
    }

    if node.is_leaf() {
        out.push_str(" />\n");
        return;
    }
    out.push_str(">\n");
    for child in &node.children {
        write_node(out, child, level + 1);
    }
    let _ = writeln!(out, "{}</{}>", indent, node.name);
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
