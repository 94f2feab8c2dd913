// Benchmark for G-code tokenizing and dispatch
// Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use gantry_host::device::DeviceState;
use gantry_host::gcode::{dispatch, parse_line, Program};

fn led_program(lines: usize) -> String {
    let mut gcode = String::new();
    for i in 0..lines {
        gcode.push_str(&format!("G1 X{} Y{} F1500\n", i, i));
        gcode.push_str(&format!("M150 P{} R{} G{} B0 I0.5 ; step {}\n", i % 8 + 1, i % 256, 255 - i % 256, i));
    }
    gcode
}

fn bench_tokenizer(c: &mut Criterion) {
    let gcode = led_program(10_000);
    c.bench_function("tokenize 20k lines", |b| {
        b.iter(|| {
            let count = gcode
                .lines()
                .filter(|line| matches!(parse_line(line), Ok(Some(_))))
                .count();
            assert_eq!(count, 20_000);
        });
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let program = Program::parse(&led_program(10_000));
    c.bench_function("dispatch 20k commands", |b| {
        b.iter(|| {
            let mut device = DeviceState::new();
            for line in program.lines() {
                if let Ok(command) = &line.parsed {
                    dispatch(command, &mut device).unwrap();
                }
            }
            assert_eq!(device.leds().count(), 8);
        });
    });
}

criterion_group!(benches, bench_tokenizer, bench_dispatch);
criterion_main!(benches);
