use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::PathBuf;

use portpics::file_ops::plan_tasks;
use portpics::grouping::DateGroups;
use portpics::naming::{NameContext, Template};
use portpics::{CaptureDate, Options};

/// Synthetic groups spread over a year, ten pictures per day.
fn build_groups(files: usize) -> DateGroups {
    let mut groups = DateGroups::new();
    for i in 0..files {
        let day = (i / 10) as u32;
        let date = CaptureDate::new(2024, 1 + (day / 28) % 12, 1 + day % 28);
        groups.insert(date, PathBuf::from(format!("/pictures/DSC_{:05}.JPG", i)));
    }
    groups
}

fn benchmark_render(c: &mut Criterion) {
    let template = Template::parse("%y%m%d_%n_%f");
    let ctx = NameContext {
        date: CaptureDate::new(2024, 6, 15),
        original_name: "DSC_00042.JPG",
        sequence: 42,
        width: 5,
    };

    c.bench_function("render_name", |b| b.iter(|| black_box(&template).render(black_box(&ctx))));
    c.bench_function("parse_template", |b| {
        b.iter(|| Template::parse(black_box("/archive/%y/%m/%d/%y%m%d_%n_%f")))
    });
}

fn benchmark_plan(c: &mut Criterion) {
    let options = Options {
        output_template: "/archive/%y/%m/%d".to_string(),
        name_template: "%y%m%d_%n_%f".to_string(),
        ..Options::default()
    };

    let mut group = c.benchmark_group("plan_tasks");
    for files in [100usize, 1_000, 10_000] {
        let groups = build_groups(files);
        group.bench_with_input(BenchmarkId::from_parameter(files), &groups, |b, groups| {
            b.iter(|| plan_tasks(black_box(groups), &options))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_render, benchmark_plan);
criterion_main!(benches);
