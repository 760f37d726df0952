use serde::Deserialize;

use crate::core::{
    presentation_definition::{PresentationDefinition, SubmissionRequirement},
    presentation_submission::*,
};

use serde_json::json;
use std::{
    ffi::OsStr,
    fs::{self, File},
    path::PathBuf,
};

fn fixtures(dir: &str) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = fs::read_dir(format!("tests/fixtures/{dir}"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension() == Some(OsStr::new("json")))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no fixtures in {dir}");
    paths
}

fn deserialize_fixture<T: for<'de> Deserialize<'de>>(path: PathBuf) -> T {
    println!("{} -> ", path.file_name().unwrap().to_str().unwrap());
    let file = File::open(path).unwrap();
    let jd = &mut serde_json::Deserializer::from_reader(file);
    let value = serde_path_to_error::deserialize(jd)
        .map_err(|e| e.path().to_string())
        .unwrap();
    println!("✅");
    value
}

#[test]
fn request_example() {
    let value = json!(
        {
            "id": "36682080-c2ed-4ba6-a4cd-37c86ef2da8c",
            "input_descriptors": [
                {
                    "id": "d05a7f51-ac09-43af-8864-e00f0175f2c7",
                    "schema": {
                        "uri": ["https://www.w3.org/2018/credentials/examples/v1"]
                    },
                    "constraints": {
                        "fields": [
                            {
                                "path": [
                                    "$.type"
                                ],
                                "filter": {
                                    "type": "string",
                                    "pattern": "IDCardCredential"
                                }
                            }
                        ]
                    }
                }
            ]
        }
    );
    let _: PresentationDefinition = serde_json::from_value(value).unwrap();
}

#[derive(Deserialize)]
pub struct PresentationDefinitionTest {
    #[serde(alias = "presentation_definition")]
    pd: PresentationDefinition,
}

#[test]
fn presentation_definition_suite() {
    for path in fixtures("presentation-definition") {
        let test: PresentationDefinitionTest = deserialize_fixture(path);
        assert!(!test.pd.input_descriptors().is_empty());
    }
}

#[derive(Deserialize)]
pub struct PresentationSubmissionTest {
    #[serde(alias = "presentation_submission")]
    ps: PresentationSubmission,
}

#[test]
fn presentation_submission_suite() {
    for path in fixtures("presentation-submission") {
        let test: PresentationSubmissionTest = deserialize_fixture(path);
        assert!(!test.ps.descriptor_map().is_empty());
    }
}

#[derive(Deserialize)]
pub struct SubmissionRequirementsTest {
    #[serde(alias = "submission_requirements")]
    _sr: Vec<SubmissionRequirement>,
}

#[test]
fn submission_requirements_suite() {
    for path in fixtures("submission-requirements") {
        let _: SubmissionRequirementsTest = deserialize_fixture(path);
    }
}
