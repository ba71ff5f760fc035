use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sdf_extractor::app::adapters::locations::InputLocation;
use sdf_extractor::app::services::pipeline::{CollectingSink, Pipeline};
use sdf_extractor::app::services::sdf_parser::{RecordParser, RecordSplitter};
use sdf_extractor::ReaderConfig;
use std::io::Cursor;

/// Ethanol with a handful of descriptor properties
const RECORD: &str = "\
ethanol
  bench          2D

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.2990    0.7500    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.5981   -0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  1  0
M  END
> <ALogP>
-0.14

> <TPSA>
20.23

> <BCUT>
11.2

> <Supplier>
Acme

$$$$
";

fn input(records: usize) -> String {
    RECORD.repeat(records)
}

fn bench_split_and_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_and_parse");
    let parser = RecordParser::new().unwrap();

    for records in [100usize, 1000] {
        let data = input(records);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(records), &data, |b, data| {
            b.iter(|| {
                let splitter = RecordSplitter::new(Cursor::new(black_box(data.as_bytes())));
                let mut parsed = 0usize;
                for raw in splitter.flatten() {
                    if parser.parse(&raw.text).is_ok() {
                        parsed += 1;
                    }
                }
                parsed
            })
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let data = input(1000);
    group.throughput(Throughput::Elements(1000));

    for (name, config) in [
        ("fixed", ReaderConfig::default()),
        ("discovery", ReaderConfig::default().with_discovery()),
    ] {
        let pipeline = Pipeline::new(config).unwrap();
        let location = InputLocation::in_memory("bench.sdf", data.clone().into_bytes());
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut sink = CollectingSink::new();
                pipeline
                    .execute(black_box(std::slice::from_ref(&location)), &mut sink)
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_split_and_parse, bench_pipeline);
criterion_main!(benches);
