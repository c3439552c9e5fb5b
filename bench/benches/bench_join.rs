use std::time::Duration;

use rand::{Rng, SeedableRng};

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, BenchmarkGroup, Criterion, SamplingMode,
};

use set_sim_join::tokenizer::WhitespaceTokenizer;
use set_sim_join::{JoinConfig, SetSimJoiner, SideSpec, SimMeasure, Table};

const SAMPLE_SIZE: usize = 10;
const WARM_UP_TIME: Duration = Duration::from_secs(5);
const MEASURE_TIME: Duration = Duration::from_secs(10);

const MIN_RECORDS: usize = 1000;
const MAX_RECORDS: usize = 100000;
const VOCAB_SIZE: usize = 10000;
const MAX_TOKENS: usize = 20;
const THRESHOLDS: [f64; 3] = [0.5, 0.7, 0.9];

// Token ids are skewed to small values, like word frequencies.
fn random_table<R: Rng>(rng: &mut R, num_records: usize) -> Table {
    let mut table = Table::new(["id", "text"]).unwrap();
    for i in 0..num_records {
        let len = rng.gen_range(1..=MAX_TOKENS);
        let text = (0..len)
            .map(|_| {
                let t = rng
                    .gen_range(0..VOCAB_SIZE)
                    .min(rng.gen_range(0..VOCAB_SIZE));
                format!("w{t}")
            })
            .collect::<Vec<_>>()
            .join(" ");
        table.add_row([Some(i.to_string()), Some(text)]).unwrap();
    }
    table
}

fn criterion_skewed(c: &mut Criterion) {
    let mut group = c.benchmark_group("skewed");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP_TIME);
    group.measurement_time(MEASURE_TIME);
    group.sampling_mode(SamplingMode::Flat);

    add_join_benches(&mut group);
}

macro_rules! bench_common {
    ($name:expr, $method:ident, $measure:expr, $group:ident) => {
        let mut rng = rand_xoshiro::SplitMix64::seed_from_u64(42);
        let mut num_records = MIN_RECORDS;
        while num_records <= MAX_RECORDS {
            let ltable = random_table(&mut rng, num_records);
            let rtable = random_table(&mut rng, num_records);
            let left = SideSpec::left("id", "text");
            let right = SideSpec::right("id", "text");
            for &threshold in &THRESHOLDS {
                let joiner = SetSimJoiner::new(JoinConfig::new($measure, threshold).unwrap());
                let bench_name = format!("{}/{}/{num_records}/{threshold}", $name, $measure);
                $group.bench_function(bench_name, |b| {
                    b.iter(|| {
                        let output = joiner
                            .$method(&ltable, &left, &rtable, &right, &WhitespaceTokenizer)
                            .unwrap();
                        if output.len() == usize::MAX {
                            panic!();
                        }
                    });
                });
            }
            num_records *= 10;
        }
    };
}

fn add_join_benches(group: &mut BenchmarkGroup<WallTime>) {
    bench_common!("join", join, SimMeasure::Jaccard, group);
    bench_common!("join_in_parallel", join_in_parallel, SimMeasure::Jaccard, group);
    bench_common!("join_in_parallel", join_in_parallel, SimMeasure::Cosine, group);
}

criterion_group!(benches, criterion_skewed);
criterion_main!(benches);
