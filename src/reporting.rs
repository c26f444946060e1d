// Report output for analysis results
// Canonical JSON for downstream diffing/hashing plus a Markdown summary

use crate::models::{ApiFlow, OpenApiSpec};
use chrono::Local;
use serde::Serialize;
use std::fs::File;
use std::io::Write;

/// Everything one analysis run produced, in one serializable value.
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub spec: &'a OpenApiSpec,
    pub flows: &'a [ApiFlow],
}

/// Serialize with every object's keys alphabetically sorted, so repeated
/// runs over the same input are byte-identical and downstream consumers can
/// diff or hash the output. Going through `serde_json::Value` pins the key
/// order (its object map is a sorted map).
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    serde_json::to_string_pretty(&value)
}

pub fn export_json(spec: &OpenApiSpec, flows: &[ApiFlow]) -> Result<String, std::io::Error> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let filename = format!("apilens_report_{}.json", timestamp);
    let report = AnalysisReport { spec, flows };
    let body = to_canonical_json(&report)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let mut file = File::create(&filename)?;
    file.write_all(body.as_bytes())?;
    Ok(filename)
}

pub fn export_markdown(spec: &OpenApiSpec, flows: &[ApiFlow]) -> Result<String, std::io::Error> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let filename = format!("apilens_report_{}.md", timestamp);
    let mut file = File::create(&filename)?;

    writeln!(file, "# {} ({})\n", spec.title, spec.version)?;

    writeln!(file, "## Endpoints\n")?;
    for endpoint in &spec.endpoints {
        writeln!(
            file,
            "- **{}** `{} {}`",
            endpoint.data_sensitivity, endpoint.method, endpoint.path
        )?;
        for classification in &endpoint.classification {
            writeln!(
                file,
                "  - `{}` {} ({}): {}",
                classification.field_path,
                classification.category,
                classification.sensitivity,
                classification.reason
            )?;
        }
    }

    writeln!(file, "\n## Flows\n")?;
    for flow in flows {
        writeln!(file, "- **{}**", flow.name)?;
        for step in &flow.steps {
            writeln!(
                file,
                "  {}. `{} {}`",
                step.step_number, step.endpoint.method, step.endpoint.path
            )?;
        }
    }

    Ok(filename)
}
