use std::io::Cursor;

use rust_fnn::{DataReader, DataWriter, Network, Pages, RandomGenerator, train};

// Segments a..g lit for each digit.
const SEGMENTS: [[u8; 7]; 10] = [
    [1, 1, 1, 1, 1, 1, 0],
    [0, 1, 1, 0, 0, 0, 0],
    [1, 1, 0, 1, 1, 0, 1],
    [1, 1, 1, 1, 0, 0, 1],
    [0, 1, 1, 0, 0, 1, 1],
    [1, 0, 1, 1, 0, 1, 1],
    [1, 0, 1, 1, 1, 1, 1],
    [1, 1, 1, 0, 0, 0, 0],
    [1, 1, 1, 1, 1, 1, 1],
    [1, 1, 1, 1, 0, 1, 1],
];

fn join(values: impl Iterator<Item = u8>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

fn main() -> rust_fnn::Result<()> {
    let dataset: String = SEGMENTS.iter().map(|s| join(s.iter().copied()) + "\n").collect();
    let targets: String = (0..10)
        .map(|d| join((0..10).map(|j| u8::from(j == d))) + "\n")
        .collect();

    // 7 -> 20 -> 20 -> 10, leaky ReLU hidden layers and sigmoid outputs.
    let mut pages = Pages::seven_segment()?;
    let mut net = Network::create(&mut pages)?;
    net.init_weights(0.5, &mut RandomGenerator::new(0));

    for epoch in 1..=2_000 {
        let report = train::train(
            &mut net,
            &mut DataReader::new(Cursor::new(&dataset)),
            &mut DataReader::new(Cursor::new(&targets)),
            &mut DataWriter::new(std::io::sink()),
        )?;
        if epoch % 500 == 0 {
            println!("epoch={epoch} mean_error={:.6}", report.mean_error);
        }
    }

    let mut decoded = DataWriter::new(Vec::new());
    let report = train::validate(
        &mut net,
        &mut DataReader::new(Cursor::new(&dataset)),
        &mut DataReader::new(Cursor::new(&targets)),
        &mut decoded,
    )?;
    println!(
        "samples={} errors={} accuracy={:.1}%",
        report.samples,
        report.errors,
        report.accuracy * 100.0
    );

    net.destroy();
    Ok(())
}
