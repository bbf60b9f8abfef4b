use rand::Rng;
use tracing_subscriber::EnvFilter;
use wmh::{HasherConfig, SparseBag};

fn main() -> wmh::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = HasherConfig::new(1000, 256, 1);
    let start = std::time::Instant::now();
    let hasher = config.build()?;
    println!("hasher built elapsed: {:?}", start.elapsed());

    let mut rng = rand::thread_rng();
    let base: Vec<(usize, f32)> = (0..100)
        .map(|_| (rng.gen_range(0..1000), rng.gen_range(0.1..10.0)))
        .collect();

    let mut bags = Vec::new();
    for keep in [100, 90, 75, 50, 25] {
        let mut pairs = base.clone();
        pairs.truncate(keep);
        pairs.sort_by_key(|&(index, _)| index);
        pairs.dedup_by_key(|&mut (index, _)| index);
        bags.push(SparseBag::new(
            pairs.iter().map(|&(_, v)| v).collect(),
            pairs.iter().map(|&(i, _)| i).collect(),
        ));
    }

    let start = std::time::Instant::now();
    let sketches = hasher.hash_batch(&bags)?;
    println!("{} bags hashed elapsed: {:?}", bags.len(), start.elapsed());

    for (bag, sketch) in bags.iter().zip(&sketches) {
        let matches = sketch
            .iter()
            .zip(&sketches[0])
            .filter(|(a, b)| a == b)
            .count();
        println!(
            "{:>4} features: {:.3} of words shared with the full bag",
            bag.indices.len(),
            matches as f64 / sketch.len() as f64
        );
    }
    Ok(())
}
