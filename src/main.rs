// Main CLI entry point for apilens
// Uses clap for argument parsing

use apilens::classifier::DataClassifier;
use apilens::flows::FlowAnalyzer;
use apilens::parsers::OpenApiParser;
use apilens::reporting::{export_json, export_markdown, to_canonical_json};
use clap::{Arg, Command};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let matches = Command::new("apilens")
        .version("0.1.0")
        .about("OpenAPI data-sensitivity and call-flow analyzer for security review")
        .after_help("EXAMPLES:\n  apilens --input openapi.yaml\n  apilens -i https://api.example.com/openapi.json --json-report\n  apilens -i spec.json --no-flows --print-spec\n\nOPTIONS:\n  --no-classify        Skip data-sensitivity classification\n  --no-flows           Skip call-flow analysis\n  --json-report        Write a canonical JSON report file\n  --markdown-report    Write a Markdown report file\n  --print-spec         Print the canonical spec JSON to stdout")
        .arg(Arg::new("input")
            .short('i')
            .long("input")
            .required(true)
            .num_args(1)
            .help("Path or URL of an OpenAPI document (JSON or YAML)"))
        .arg(Arg::new("no_classify")
            .long("no-classify")
            .action(clap::ArgAction::SetTrue)
            .help("Skip data-sensitivity classification"))
        .arg(Arg::new("no_flows")
            .long("no-flows")
            .action(clap::ArgAction::SetTrue)
            .help("Skip call-flow analysis"))
        .arg(Arg::new("json_report")
            .long("json-report")
            .action(clap::ArgAction::SetTrue)
            .help("Write a canonical JSON report file"))
        .arg(Arg::new("markdown_report")
            .long("markdown-report")
            .action(clap::ArgAction::SetTrue)
            .help("Write a Markdown report file"))
        .arg(Arg::new("print_spec")
            .long("print-spec")
            .action(clap::ArgAction::SetTrue)
            .help("Print the canonical spec JSON to stdout"))
        .get_matches();

    let input = matches.get_one::<String>("input").expect("input is required");
    let classify = !matches.get_flag("no_classify");
    let analyze_flows = !matches.get_flag("no_flows");

    let spec = OpenApiParser::parse_location(input).unwrap_or_else(|e| {
        eprintln!("Failed to load API description: {}", e);
        std::process::exit(1);
    });
    println!(
        "Parsed {} ({}): {} endpoints, {} schemas.",
        spec.title,
        spec.version,
        spec.endpoints.len(),
        spec.schemas.len()
    );

    let spec = if classify {
        DataClassifier::classify_spec(&spec)
    } else {
        spec
    };

    if classify {
        for endpoint in &spec.endpoints {
            println!(
                "[{}] {} {} ({} classified fields)",
                endpoint.data_sensitivity,
                endpoint.method,
                endpoint.path,
                endpoint.classification.len()
            );
        }
    }

    let flows = if analyze_flows {
        FlowAnalyzer::analyze(&spec)
    } else {
        Vec::new()
    };

    if analyze_flows {
        println!("Detected {} flows.", flows.len());
        for flow in &flows {
            println!("  {} ({} steps)", flow.name, flow.steps.len());
        }
    }

    if matches.get_flag("print_spec") {
        match to_canonical_json(&spec) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize spec: {}", e),
        }
    }

    if matches.get_flag("json_report") {
        match export_json(&spec, &flows) {
            Ok(filename) => println!("Wrote {}", filename),
            Err(e) => eprintln!("Failed to write JSON report: {}", e),
        }
    }
    if matches.get_flag("markdown_report") {
        match export_markdown(&spec, &flows) {
            Ok(filename) => println!("Wrote {}", filename),
            Err(e) => eprintln!("Failed to write Markdown report: {}", e),
        }
    }
}
