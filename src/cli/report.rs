//! `report` subcommand: analyze every function in a snapshot and print which
//! exceptions can escape from each, with provenance call chains.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::analysis::{ExceptionAnalyzer, ExceptionInfo, ThrowState};
use crate::error::{Error, Result};
use crate::ir::{json, Program, SourceLoc};

pub struct ReportArgs {
    pub input: PathBuf,
    pub format: String,
    pub ignore: Vec<String>,
    pub keep_alloc_failure: bool,
}

#[derive(Debug, Serialize)]
struct FunctionFinding {
    function: String,
    loc: SourceLoc,
    state: ThrowState,
    /// False when the recorded exceptions are only a lower bound
    complete: bool,
    exceptions: Vec<EscapeFinding>,
}

#[derive(Debug, Serialize)]
struct EscapeFinding {
    exception: String,
    thrown_at: SourceLoc,
    /// Call chain from the analyzed function to the throw, outermost first
    call_chain: Vec<String>,
}

pub fn report(args: &ReportArgs) -> Result<()> {
    let program = json::load_file(&args.input)?;

    let mut analyzer = ExceptionAnalyzer::new(&program);
    analyzer.configure(
        !args.keep_alloc_failure,
        args.ignore.iter().cloned().collect::<HashSet<_>>(),
    );

    let mut findings = Vec::with_capacity(program.function_count());
    for (func, decl) in program.functions() {
        let info = analyzer.analyze_function(func);
        findings.push(to_finding(&program, &decl.name, decl.loc, &info));
    }

    match args.format.as_str() {
        "json" => {
            let rendered = serde_json::to_string_pretty(&findings)
                .map_err(|e| Error::internal(format!("Failed to render report: {}", e)))?;
            println!("{}", rendered);
        }
        "text" => print_text(&findings),
        other => {
            return Err(Error::internal(format!("unknown output format: {}", other)));
        }
    }
    Ok(())
}

fn to_finding(
    program: &Program,
    name: &str,
    loc: SourceLoc,
    info: &ExceptionInfo,
) -> FunctionFinding {
    let mut exceptions: Vec<EscapeFinding> = info
        .exceptions()
        .iter()
        .map(|(&exception, site)| EscapeFinding {
            exception: program.type_name(exception).to_string(),
            thrown_at: site.loc,
            call_chain: site
                .trace
                .frames()
                .iter()
                .map(|frame| program.function(frame.function).name.clone())
                .collect(),
        })
        .collect();
    // HashMap iteration order is arbitrary; sort for stable output.
    exceptions.sort_by(|a, b| a.exception.cmp(&b.exception));

    FunctionFinding {
        function: name.to_string(),
        loc,
        state: info.state(),
        complete: !info.contains_unknown_elements(),
        exceptions,
    }
}

fn print_text(findings: &[FunctionFinding]) {
    for finding in findings {
        match finding.state {
            ThrowState::Throwing => {
                let completeness = if finding.complete {
                    "complete"
                } else {
                    "lower bound"
                };
                println!(
                    "{} ({}): throwing ({})",
                    finding.function, finding.loc, completeness
                );
                for escape in &finding.exceptions {
                    if escape.call_chain.is_empty() {
                        println!("    {} thrown at {}", escape.exception, escape.thrown_at);
                    } else {
                        println!(
                            "    {} thrown at {} via {}",
                            escape.exception,
                            escape.thrown_at,
                            escape.call_chain.join(" -> ")
                        );
                    }
                }
            }
            state => {
                println!("{} ({}): {}", finding.function, finding.loc, state);
            }
        }
    }
}
