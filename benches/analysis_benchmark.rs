use criterion::{black_box, criterion_group, criterion_main, Criterion};
use throw_trace_rs::analysis::ExceptionAnalyzer;
use throw_trace_rs::ir::{CallTarget, FuncId, Program, SourceLoc, StmtKind};

/// f0 -> f1 -> ... -> f(n-1), with the last function throwing
fn deep_chain(depth: u32) -> (Program, FuncId) {
    let mut program = Program::new();
    let error = program.add_type("chain::error", vec![]);

    let funcs: Vec<FuncId> = (0..depth)
        .map(|i| program.add_function(format!("f{}", i), SourceLoc::new(i + 1, 1)))
        .collect();

    for i in 0..depth as usize - 1 {
        let call = program.add_stmt(
            StmtKind::Call {
                target: CallTarget::Direct(funcs[i + 1]),
                args: vec![],
            },
            SourceLoc::new(i as u32 + 1, 5),
        );
        program.set_body(funcs[i], call);
    }
    let throw = program.add_stmt(
        StmtKind::Throw {
            exception: Some(error),
        },
        SourceLoc::new(depth, 5),
    );
    program.set_body(funcs[depth as usize - 1], throw);

    (program, funcs[0])
}

/// Many entry points all calling one shared throwing callee
fn wide_fan_in(width: u32) -> (Program, Vec<FuncId>) {
    let mut program = Program::new();
    let error = program.add_type("shared::error", vec![]);

    let shared = program.add_function("shared", SourceLoc::new(1, 1));
    let throw = program.add_stmt(
        StmtKind::Throw {
            exception: Some(error),
        },
        SourceLoc::new(2, 5),
    );
    program.set_body(shared, throw);

    let entries: Vec<FuncId> = (0..width)
        .map(|i| {
            let entry = program.add_function(format!("entry{}", i), SourceLoc::new(i + 10, 1));
            let call = program.add_stmt(
                StmtKind::Call {
                    target: CallTarget::Direct(shared),
                    args: vec![],
                },
                SourceLoc::new(i + 10, 5),
            );
            program.set_body(entry, call);
            entry
        })
        .collect();

    (program, entries)
}

fn analysis_benchmark(c: &mut Criterion) {
    let (chain_program, chain_root) = deep_chain(256);
    c.bench_function("deep_call_chain_cold", |b| {
        b.iter(|| {
            let mut analyzer = ExceptionAnalyzer::new(&chain_program);
            black_box(analyzer.analyze_function(chain_root));
        });
    });

    c.bench_function("deep_call_chain_cached", |b| {
        let mut analyzer = ExceptionAnalyzer::new(&chain_program);
        analyzer.analyze_function(chain_root);
        b.iter(|| {
            black_box(analyzer.analyze_function(chain_root));
        });
    });

    let (fan_program, entries) = wide_fan_in(128);
    c.bench_function("wide_fan_in", |b| {
        b.iter(|| {
            let mut analyzer = ExceptionAnalyzer::new(&fan_program);
            for &entry in &entries {
                black_box(analyzer.analyze_function(entry));
            }
        });
    });
}

criterion_group!(benches, analysis_benchmark);
criterion_main!(benches);
