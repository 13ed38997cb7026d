//! Test Transaction Producer
//!
//! Generates and publishes test transactions to NATS for pipeline testing.

use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Transaction structure matching the pipeline's expected format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Transaction {
    transaction_id: String,
    sender_id: String,
    receiver_id: String,
    amount: f64,
    location: String,
    #[serde(rename = "type")]
    tx_type: String,
    channel: String,
    timestamp: DateTime<Utc>,
}

/// Transaction generator for testing
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
    transaction_counter: u64,
}

impl TransactionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            transaction_counter: 0,
        }
    }

    /// Generate a transaction that fits the seeded demo profiles: daytime,
    /// familiar location, amount near the learned mean.
    fn generate_typical(&mut self) -> Transaction {
        self.transaction_counter += 1;
        let hour = self.rng.gen_range(9..21);

        Transaction {
            transaction_id: format!("tx_{:012}", self.transaction_counter),
            sender_id: self
                .random_choice(&["alice", "bob", "carol"])
                .to_string(),
            receiver_id: format!("merchant_{}", self.rng.gen_range(1..500)),
            amount: self.rng.gen_range(2000.0..8000.0),
            location: self
                .random_choice(&["home_atm", "office_branch", "city_mall"])
                .to_string(),
            tx_type: self
                .random_choice(&["transfer", "withdrawal", "payment"])
                .to_string(),
            channel: self.random_choice(&["upi", "card", "netbanking"]).to_string(),
            timestamp: at_hour(hour, self.rng.gen_range(0..60)),
        }
    }

    /// Generate a suspicious transaction: large amount, unfamiliar
    /// location, night hours.
    fn generate_suspicious(&mut self) -> Transaction {
        self.transaction_counter += 1;
        let hour = self.rng.gen_range(0..5);

        Transaction {
            transaction_id: format!("tx_{:012}", self.transaction_counter),
            sender_id: self
                .random_choice(&["alice", "bob", "carol", "stranger"])
                .to_string(),
            receiver_id: format!("merchant_{}", self.rng.gen_range(1..500)),
            amount: self.rng.gen_range(20_000.0..100_000.0), // High amount
            location: self
                .random_choice(&["overseas_kiosk", "unknown_terminal"])
                .to_string(),
            tx_type: "transfer".to_string(),
            channel: "upi".to_string(),
            timestamp: at_hour(hour, self.rng.gen_range(0..60)), // Night time
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

/// Today's date at the given hour and minute, so generated transactions
/// land in a controlled time-of-day band.
fn at_hour(hour: u32, minute: u32) -> DateTime<Utc> {
    let today = Utc::now().date_naive();
    let naive = today.and_hms_opt(hour, minute, 0).unwrap();
    Utc.from_utc_datetime(&naive)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Transaction Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("transactions");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let suspicious_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        suspicious_rate = suspicious_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, suspicious_rate, delay_ms).await;
        }
    };

    // Generate and publish transactions
    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} transactions...", count);

    let mut typical_count = 0;
    let mut suspicious_count = 0;

    for i in 0..count {
        let transaction = if rng.gen_bool(suspicious_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            typical_count += 1;
            generator.generate_typical()
        };

        let payload = serde_json::to_vec(&transaction)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} transactions ({} typical, {} suspicious)",
                i + 1,
                count,
                typical_count,
                suspicious_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Published {} transactions ({} typical, {} suspicious)",
        count, typical_count, suspicious_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, suspicious_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let transaction = if rng.gen_bool(suspicious_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_typical()
        };

        let json = serde_json::to_string_pretty(&transaction)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample transaction {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
