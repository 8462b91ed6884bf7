//! Writes a deterministic dummy-transactions CSV for trying out the dashboard.

const OUTPUT_PATH: &str = "sample_transactions.csv";
const ROWS: usize = 2000;

const ACCOUNT_TYPES: [&str; 4] = ["Savings", "Current", "Business", "Corporate"];
const REGIONS: [&str; 5] = ["North", "South", "East", "West", "Central"];
const BANKS: [&str; 10] = [
    "Apex Bank",
    "Harbor Bank",
    "Crescent Bank",
    "Summit Bank",
    "Meridian Bank",
    "Pinnacle Bank",
    "Northgate Bank",
    "Sterling Trust",
    "Union Commerce",
    "First Capital",
];

fn pick<'a>(rng: &mut SimpleRng, items: &[&'a str]) -> &'a str {
    items[(rng.next_u64() % items.len() as u64) as usize]
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let mut writer = csv::Writer::from_path(OUTPUT_PATH).expect("Failed to create output file");
    writer
        .write_record([
            "Account Type",
            "Region",
            "Transaction To",
            "Credit",
            "Debit",
            "Date",
        ])
        .expect("Failed to write header");

    for row in 0..ROWS {
        let account_type = pick(&mut rng, &ACCOUNT_TYPES);
        let region = pick(&mut rng, &REGIONS);
        let bank = pick(&mut rng, &BANKS);

        // Log-normal amounts: most flows cluster in the low thousands with a
        // heavy tail, and every 400th row is inflated into a clear outlier so
        // the anomaly summary has something to flag.
        let mut amount = rng.gauss(8.0, 0.8).exp();
        if row % 400 == 399 {
            amount *= 80.0;
        }
        let amount = (amount * 100.0).round() / 100.0;

        let (credit, debit) = if rng.next_f64() < 0.5 {
            (amount, 0.0)
        } else {
            (0.0, amount)
        };

        let year = 2018 + rng.next_u64() % 7;
        let month = 1 + rng.next_u64() % 12;
        let day = 1 + rng.next_u64() % 28;
        let date = format!("{year:04}-{month:02}-{day:02}");

        let credit = format!("{credit:.2}");
        let debit = format!("{debit:.2}");
        writer
            .write_record([
                account_type,
                region,
                bank,
                credit.as_str(),
                debit.as_str(),
                date.as_str(),
            ])
            .expect("Failed to write row");
    }

    writer.flush().expect("Failed to flush output");
    println!("Wrote {ROWS} transactions to {OUTPUT_PATH}");
}
