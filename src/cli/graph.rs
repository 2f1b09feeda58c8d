//! `graph` subcommand: export the snapshot's call graph annotated with
//! per-function throw states as DOT.

use std::path::Path;

use crate::analysis::{call_graph, ExceptionAnalyzer};
use crate::error::{Error, Result};
use crate::ir::json;

pub fn graph(input: &Path, dot_output: Option<&Path>) -> Result<()> {
    let program = json::load_file(input)?;
    let mut analyzer = ExceptionAnalyzer::new(&program);

    let dot = call_graph::render_dot(&program, &mut analyzer);
    match dot_output {
        Some(path) => {
            std::fs::write(path, &dot)
                .map_err(|e| Error::Io(format!("Failed to write DOT file: {}", e)))?;
            println!("DOT exported to: {}", path.display());
        }
        None => println!("{}", dot),
    }
    Ok(())
}
