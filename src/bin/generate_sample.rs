use std::sync::Arc;

use arrow::array::{Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Days, NaiveDate};
use parquet::arrow::ArrowWriter;

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }
}

struct Sale {
    date: NaiveDate,
    product: &'static str,
    category: &'static str,
    value: f64,
}

/// (product, category, list price)
const CATALOG: &[(&str, &str, f64)] = &[
    ("Teclado", "Periféricos", 150.00),
    ("Mouse", "Periféricos", 80.50),
    ("Monitor", "Telas", 1200.00),
    ("Cadeira", "Móveis", 850.00),
    ("Headset", "Áudio", 250.00),
    ("Webcam", "Periféricos", 320.00),
    ("Mesa", "Móveis", 1400.00),
    ("Caixa de Som", "Áudio", 410.00),
    ("Notebook", "Computadores", 4800.00),
    ("Tablet", "Computadores", 2100.00),
    ("Roteador", "Redes", 390.00),
    ("Switch", "Redes", 720.00),
];

fn generate_sales(days: u64, rng: &mut SimpleRng) -> Vec<Sale> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid start date");
    let mut sales = Vec::new();
    for offset in 0..days {
        let date = start + Days::new(offset);
        let n_sales = 1 + rng.below(4);
        for _ in 0..n_sales {
            let (product, category, price) = CATALOG[rng.below(CATALOG.len())];
            let quantity = 1 + rng.below(3);
            // list price with up to 15% discount
            let discount = 1.0 - 0.15 * rng.next_f64();
            let value = (price * quantity as f64 * discount * 100.0).round() / 100.0;
            sales.push(Sale {
                date,
                product,
                category,
                value,
            });
        }
    }
    sales
}

fn write_csv(sales: &[Sale], path: &str) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create CSV file");
    writer
        .write_record(["Data", "Produto", "Categoria", "Valor"])
        .expect("Failed to write header");
    for sale in sales {
        writer
            .write_record([
                sale.date.format("%Y-%m-%d").to_string(),
                sale.product.to_string(),
                sale.category.to_string(),
                format!("{:.2}", sale.value),
            ])
            .expect("Failed to write record");
    }
    writer.flush().expect("Failed to flush CSV");
}

fn write_parquet(sales: &[Sale], path: &str) {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid epoch");
    let dates = Date32Array::from(
        sales
            .iter()
            .map(|s| (s.date - epoch).num_days() as i32)
            .collect::<Vec<_>>(),
    );
    let products = StringArray::from(sales.iter().map(|s| s.product).collect::<Vec<_>>());
    let categories = StringArray::from(sales.iter().map(|s| s.category).collect::<Vec<_>>());
    let values = Float64Array::from(sales.iter().map(|s| s.value).collect::<Vec<_>>());

    let schema = Arc::new(Schema::new(vec![
        Field::new("Data", DataType::Date32, false),
        Field::new("Produto", DataType::Utf8, false),
        Field::new("Categoria", DataType::Utf8, false),
        Field::new("Valor", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(dates),
            Arc::new(products),
            Arc::new(categories),
            Arc::new(values),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let sales = generate_sales(60, &mut rng);

    write_csv(&sales, "vendas_mock.csv");
    write_parquet(&sales, "vendas_mock.parquet");

    let total: f64 = sales.iter().map(|s| s.value).sum();
    println!(
        "Wrote {} sales ({} days, total {total:.2}) to vendas_mock.csv and vendas_mock.parquet",
        sales.len(),
        60
    );
}
