#![allow(dead_code)]

use criterion::{criterion_group, criterion_main, Criterion};
use std::time::Duration;

use bb_simulator::{
    config::Config,
    machine::Machine,
    macro_machine::{encode_macro_table, MACRO_STATE_START},
    run::MachineRun,
    status::RunStatus,
    tape::TapeKind,
};

const WARM_UP_TIME_MS: u64 = 500;
const MEASUREMENT_TIME_MS: u64 = 2000;

criterion_group!(benches, benchmark_tape_backends, benchmark_macro_encode);
criterion_main!(benches);

fn benchmark_tape_backends(c: &mut Criterion) {
    let machine_bb4_max = Machine::build_machine("BB4_MAX").unwrap();
    let machine_bb2x3_max = Machine::build_machine("BB2X3_MAX").unwrap();

    let mut group = c.benchmark_group("Bench Tape Backend");
    group.warm_up_time(Duration::from_millis(WARM_UP_TIME_MS));
    group.measurement_time(Duration::from_millis(MEASUREMENT_TIME_MS));

    group.bench_function("bit tape BB4 max", |b| {
        b.iter(|| bench_run_halt(&machine_bb4_max, TapeKind::Bit, 107))
    });
    group.bench_function("flat tape BB4 max", |b| {
        b.iter(|| bench_run_halt(&machine_bb4_max, TapeKind::Flat, 107))
    });
    group.bench_function("RLE tape BB4 max", |b| {
        b.iter(|| bench_run_halt(&machine_bb4_max, TapeKind::Rle, 107))
    });
    group.bench_function("flat tape BB2x3 max", |b| {
        b.iter(|| bench_run_halt(&machine_bb2x3_max, TapeKind::Flat, 38))
    });
    group.bench_function("lockstep all backends BB4 max", |b| {
        b.iter(|| bench_run_lockstep(&machine_bb4_max, 107))
    });

    group.finish();
}

fn benchmark_macro_encode(c: &mut Criterion) {
    let machine_bb2_max = Machine::build_machine("BB2_MAX").unwrap();
    let config = Config::new_default();

    let mut group = c.benchmark_group("Bench Macro Encoder");
    group.warm_up_time(Duration::from_millis(WARM_UP_TIME_MS));
    group.measurement_time(Duration::from_millis(MEASUREMENT_TIME_MS));

    for scale in [2usize, 4, 8] {
        group.bench_function(format!("encode BB2 max scale {scale}"), |b| {
            b.iter(|| {
                let table =
                    encode_macro_table(machine_bb2_max.transition_table(), scale, &config)
                        .unwrap();
                assert_eq!(1 << scale, table.n_symbols());
            })
        });
    }
    group.bench_function("encode and run BB2 max scale 4", |b| {
        b.iter(|| {
            let table =
                encode_macro_table(machine_bb2_max.transition_table(), 4, &config).unwrap();
            let mut run = MachineRun::new(&table, &[TapeKind::Flat], &config);
            run.set_state(MACRO_STATE_START);
            assert!(run.run(1_000).is_halted());
        })
    });

    group.finish();
}

fn bench_run_halt(machine: &Machine, kind: TapeKind, steps_result: u64) {
    let config = Config::new_default();
    let mut run = MachineRun::new(machine.transition_table(), &[kind], &config);
    let status = run.run(config.step_limit_run());
    assert_eq!(RunStatus::Halted(steps_result), status);
}

fn bench_run_lockstep(machine: &Machine, steps_result: u64) {
    let config = Config::builder().cross_check_interval(16).build();
    let mut run = MachineRun::new(
        machine.transition_table(),
        &[TapeKind::Bit, TapeKind::Flat, TapeKind::Rle],
        &config,
    );
    let status = run.run(config.step_limit_run());
    assert_eq!(RunStatus::Halted(steps_result), status);
}
