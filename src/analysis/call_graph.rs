//! Static call graph annotated with analysis results.
//!
//! Builds a directed graph of the snapshot's direct call edges, labels each
//! function node with its throw state, and renders DOT for visualization.

use std::collections::HashMap;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

use super::analyzer::ExceptionAnalyzer;
use crate::ir::{CallTarget, FuncId, Program, StmtId, StmtKind};

/// Build the direct-call graph. Node weights are `name [state]` labels;
/// indirect calls have no resolvable target and contribute no edge.
pub fn build(program: &Program, analyzer: &mut ExceptionAnalyzer) -> DiGraph<String, ()> {
    let mut graph = DiGraph::new();
    let mut nodes: HashMap<FuncId, NodeIndex> = HashMap::new();

    for (func, decl) in program.functions() {
        let state = analyzer.analyze_function(func).state();
        let label = format!("{} [{}]", decl.name, state);
        nodes.insert(func, graph.add_node(label));
    }

    for (func, decl) in program.functions() {
        let Some(body) = decl.body else { continue };
        let mut callees = Vec::new();
        collect_callees(program, body, &mut callees);
        callees.sort_unstable();
        callees.dedup();
        for callee in callees {
            graph.add_edge(nodes[&func], nodes[&callee], ());
        }
    }

    graph
}

/// Render the annotated call graph as DOT
pub fn render_dot(program: &Program, analyzer: &mut ExceptionAnalyzer) -> String {
    let graph = build(program, analyzer);
    format!("{:?}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
}

fn collect_callees(program: &Program, stmt: StmtId, out: &mut Vec<FuncId>) {
    match &program.stmt(stmt).kind {
        StmtKind::Call { target, args } => {
            if let CallTarget::Direct(callee) = target {
                out.push(*callee);
            }
            for &arg in args {
                collect_callees(program, arg, out);
            }
        }
        StmtKind::Try { body, handlers } => {
            collect_callees(program, *body, out);
            for handler in handlers {
                collect_callees(program, handler.body, out);
            }
        }
        StmtKind::Block { stmts } => {
            for &child in stmts {
                collect_callees(program, child, out);
            }
        }
        StmtKind::Throw { .. } | StmtKind::Leaf | StmtKind::Opaque => {}
    }
}
