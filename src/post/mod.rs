//! Postprocessors for the supported machine formats
//!
//! Each postprocessor declares the side transforms it understands and turns
//! a whole [`Job`] into one or more [`PostOutput`] buffers. Writing the
//! buffers to disk is left to the caller.

use std::str::FromStr;

use crate::config::PostConfig;
use crate::error::{PostError, Result};
use crate::frame::{NamedFrame, PartSizes};
use crate::job::Job;

pub mod ardis;
pub mod dump;
pub mod format4;
pub mod gcode;

/// Post-processor trait - implemented for each output format
pub trait PostProcessor {
    /// Human readable format name
    fn name(&self) -> &str;

    /// Extension of the files written for this format, without the dot
    fn file_extension(&self) -> &str;

    /// Frames of the stock faces this format can address, in clamping
    /// coordinates
    fn side_transforms(&self, sizes: &PartSizes, called_from_nesting: bool) -> Vec<NamedFrame>;

    /// Render the job
    fn process(&self, job: &Job) -> Result<Vec<PostOutput>>;
}

/// One rendered file.
#[derive(Debug, Clone, PartialEq)]
pub struct PostOutput {
    pub file_stem: String,
    pub extension: String,
    /// Name the host shows for this output, usually the clamping label
    pub logical_name: String,
    pub content: String,
}

impl PostOutput {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.file_stem, self.extension)
    }
}

/// Available post-processors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcessorType {
    GcodeMach3, // 2D G-code for Mach3
    Format4,    // tpaCAD Format-4 .tcn
    Ardis,      // Ardis optimizer XML
    XmlDump,    // full job dump as XML
    JsonDump,   // full job dump as JSON
}

impl PostProcessorType {
    pub const ALL: [PostProcessorType; 5] = [
        PostProcessorType::GcodeMach3,
        PostProcessorType::Format4,
        PostProcessorType::Ardis,
        PostProcessorType::XmlDump,
        PostProcessorType::JsonDump,
    ];

    /// Get the post-processor implementation
    pub fn get_processor(&self, config: &PostConfig) -> Box<dyn PostProcessor> {
        match self {
            PostProcessorType::GcodeMach3 => Box::new(gcode::Mach3Post::new(config)),
            PostProcessorType::Format4 => Box::new(format4::Format4Post::new(config)),
            PostProcessorType::Ardis => Box::new(ardis::ArdisPost::new(config)),
            PostProcessorType::XmlDump => Box::new(dump::XmlDumpPost),
            PostProcessorType::JsonDump => Box::new(dump::JsonDumpPost),
        }
    }

    /// Command line name
    pub fn key(&self) -> &'static str {
        match self {
            PostProcessorType::GcodeMach3 => "gcode",
            PostProcessorType::Format4 => "format4",
            PostProcessorType::Ardis => "ardis",
            PostProcessorType::XmlDump => "xml-dump",
            PostProcessorType::JsonDump => "json-dump",
        }
    }
}

impl FromStr for PostProcessorType {
    type Err = PostError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|post| post.key() == key)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|p| p.key()).collect();
                PostError::Config(format!("unknown postprocessor '{}', expected one of {}", s, known.join(", ")))
            })
    }
}

/// `<part code>_J1C<n>`, the stem of per-clamping program files.
pub(crate) fn program_stem(part_code: &str, index: usize) -> String {
    format!("{}_J1C{}", part_code, index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_lookup() {
        let config = PostConfig::default();
        for post in PostProcessorType::ALL {
            let parsed: PostProcessorType = post.key().parse().unwrap();
            assert_eq!(parsed, post);
            assert!(!post.get_processor(&config).name().is_empty());
        }
        assert!("heidenhain".parse::<PostProcessorType>().is_err());
    }

    #[test]
    fn test_extensions() {
        let config = PostConfig::default();
        let ext = |p: PostProcessorType| p.get_processor(&config).file_extension().to_string();
        assert_eq!(ext(PostProcessorType::GcodeMach3), "nc");
        assert_eq!(ext(PostProcessorType::Format4), "tcn");
        assert_eq!(ext(PostProcessorType::Ardis), "xml");
        assert_eq!(ext(PostProcessorType::XmlDump), "xml");
        assert_eq!(ext(PostProcessorType::JsonDump), "json");
    }

    #[test]
    fn test_program_stem() {
        assert_eq!(program_stem("P01", 0), "P01_J1C1");
        let out = PostOutput {
            file_stem: "P01_J1C1".into(),
            extension: "nc".into(),
            logical_name: "Clamp0".into(),
            content: String::new(),
        };
        assert_eq!(out.file_name(), "P01_J1C1.nc");
    }
}
