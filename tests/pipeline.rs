use pretty_assertions::assert_eq;
use woodpost::{Job, PostConfig, PostProcessorType};

const JOB: &str = r#"{
    "CallEnvironment": "Inventor",
    "Machine": { "SafePlaneHeight": 5, "ClearanceHeight": 1 },
    "Clampings": [
        {
            "Name": "Side panel",
            "Part": { "Name": "Panel", "Code": "SP-01", "Length": 72, "Width": 56, "Thickness": 1.8 },
            "Sides": [{ "Name": "Top" }],
            "Operations": [{
                "Name": "Shelf holes",
                "Side": "Top",
                "OperationType": "DrillOperation",
                "Spindle": { "Name": "V1", "Code": "5", "ToolIdentifiedBy": "ByCode", "Tool": { "Diameter": 0.5 } },
                "CuttingParameters": { "CuttingFeedrate": 300, "Speed": 6000 },
                "Trajectories": [{
                    "TrajectoryType": "DrillTrajectory",
                    "FullDepth": 1.2,
                    "Geometry": [
                        { "GeometryType": "Point", "X": 3.7, "Y": 5, "Z": 0 },
                        { "GeometryType": "Point", "X": 3.7, "Y": 8.2, "Z": 0 }
                    ]
                }]
            }]
        },
        {
            "Part": { "Code": "SP-02", "Length": 40, "Width": 30, "Thickness": 1.8 },
            "Sides": [{ "Name": "Top" }],
            "Operations": []
        }
    ]
}"#;

fn run(post: PostProcessorType) -> Vec<woodpost::PostOutput> {
    let job = Job::from_json_str(JOB).unwrap();
    post.get_processor(&PostConfig::default()).process(&job).unwrap()
}

#[test]
fn test_gcode_program_per_clamping() {
    let outputs = run(PostProcessorType::GcodeMach3);
    let names: Vec<String> = outputs.iter().map(|o| o.file_name()).collect();
    assert_eq!(names, vec!["SP-01_J1C1.nc", "SP-02_J1C2.nc"]);
    assert_eq!(outputs[0].logical_name, "Side panel");
    assert_eq!(outputs[1].logical_name, "Clamp1");

    let first: Vec<&str> = outputs[0].content.lines().collect();
    assert_eq!(first[0], "%");
    assert_eq!(first[1], "O0001");
    assert_eq!(*first.last().unwrap(), "%");
    assert!(first.contains(&"M30"));
    assert!(outputs[1].content.lines().any(|l| l == "O0002"));
}

#[test]
fn test_format4_program_per_clamping() {
    let outputs = run(PostProcessorType::Format4);
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].file_name(), "SP-01_J1C1.tcn");
    assert!(outputs[0].content.starts_with("TPA\\ALBATROS\\EDICAD\\02.00\n"));
    assert!(outputs[0].content.contains("SIDE#1{"));
}

#[test]
fn test_ardis_drawing_per_clamping() {
    let outputs = run(PostProcessorType::Ardis);
    assert_eq!(outputs[0].file_name(), "Side panel.xml");
    assert_eq!(outputs[1].file_name(), "Clamp1.xml");
    assert_eq!(outputs[0].content.matches("<FUNCTNAME>DRILL</FUNCTNAME>").count(), 2);
    assert!(outputs[0].content.contains("<X>37</X>\n<Y>82</Y>"));
    assert_eq!(outputs[1].content, "");
}

#[test]
fn test_dumps_cover_the_whole_job() {
    for post in [PostProcessorType::XmlDump, PostProcessorType::JsonDump] {
        let outputs = run(post);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].file_stem, "FullDumpForSP-01");
        assert_eq!(outputs[0].logical_name, "allClamps");
        assert!(outputs[0].content.contains("SP-02"));
        assert!(outputs[0].content.contains("DrillOperation"));
    }
}

#[test]
fn test_malformed_job_is_a_json_error() {
    let err = Job::from_json_str("{ \"Clampings\": [ }").unwrap_err();
    assert!(matches!(err, woodpost::PostError::Json(_)));
    assert!(!err.is_recoverable());
}
