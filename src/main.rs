//! Transaction Risk Pipeline - Main Entry Point
//!
//! Consumes transactions from NATS, runs policy enforcement and risk
//! scoring, drives step-up verification for elevated risk, and publishes
//! terminal assessments. Supports parallel processing for high throughput.

use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use transaction_risk_pipeline::{
    config::AppConfig,
    consumer::TransactionConsumer,
    metrics::{MetricsReporter, PipelineMetrics},
    orchestrator::DecisionOrchestrator,
    producer::DecisionProducer,
    signals::{NatsBiometricVerifier, NatsIntentConfirmer, NatsRemoteAssessor},
    stores::{JsonHistoryRecorder, JsonPolicyStore, JsonProfileStore},
    Transaction,
};

use futures::StreamExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        format!("transaction_risk_pipeline={}", config.logging.level).parse()?,
    );
    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Transaction Risk Pipeline");
    info!(
        workers = config.pipeline.workers,
        step_timeout_ms = config.pipeline.step_timeout_ms,
        "Configuration loaded successfully"
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    // Persistence collaborators
    let profiles = Arc::new(JsonProfileStore::new(&config.storage.profiles_dir));
    let policies = Arc::new(JsonPolicyStore::new(&config.storage.policies_dir));
    let recorder = Arc::new(JsonHistoryRecorder::new(&config.storage.history_dir));

    // Signal collaborators over NATS request/reply
    let biometric = Arc::new(NatsBiometricVerifier::new(
        client.clone(),
        &config.nats.biometric_subject,
    ));
    let confirmer = Arc::new(NatsIntentConfirmer::new(
        client.clone(),
        &config.nats.confirmation_subject,
    ));

    let mut orchestrator = DecisionOrchestrator::new(profiles, policies, biometric, confirmer, recorder)
        .with_step_timeout(Duration::from_millis(config.pipeline.step_timeout_ms));

    if let Some(subject) = &config.nats.remote_assessment_subject {
        orchestrator = orchestrator
            .with_remote_assessor(Arc::new(NatsRemoteAssessor::new(client.clone(), subject)));
        info!(subject = %subject, "Remote assessment enrichment enabled");
    }
    let orchestrator = Arc::new(orchestrator);

    // Initialize consumer and producer
    let consumer = TransactionConsumer::new(
        client.clone(),
        &config.nats.transaction_subject,
        &config.nats.queue_group,
    );
    let producer = Arc::new(DecisionProducer::new(
        client.clone(),
        &config.nats.decision_subject,
    ));

    let num_workers = config.pipeline.workers;
    info!(
        "Starting assessment loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", config.nats.transaction_subject);
    info!("Publishing decisions to: {}", config.nats.decision_subject);

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    // Start metrics reporter
    let metrics_clone = metrics.clone();
    let interval = config.pipeline.metrics_interval_secs;
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, interval);
        reporter.start().await;
    });

    // Process transactions in parallel
    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        // Acquire permit (limits concurrent tasks)
        let permit = semaphore.clone().acquire_owned().await.unwrap();

        let orchestrator = orchestrator.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            match serde_json::from_slice::<Transaction>(&message.payload) {
                Ok(transaction) => {
                    let tx_id = transaction.transaction_id.clone();

                    match orchestrator.submit(transaction).await {
                        Ok(assessment) => {
                            let processing_time = start_time.elapsed();
                            let abs_z = assessment
                                .risk_analysis
                                .as_ref()
                                .map(|analysis| analysis.abs_z_score);
                            metrics.record_assessment(processing_time, assessment.state, abs_z);

                            info!(
                                transaction_id = %tx_id,
                                state = ?assessment.state,
                                processing_time_us = processing_time.as_micros(),
                                "Assessment complete"
                            );

                            if let Some(reply_to) = message.reply.clone() {
                                if let Err(e) = producer.reply(reply_to, &assessment).await {
                                    warn!(
                                        transaction_id = %tx_id,
                                        error = %e,
                                        "Failed to answer request reply"
                                    );
                                }
                            }

                            if let Err(e) = producer.publish(&assessment).await {
                                error!(
                                    transaction_id = %tx_id,
                                    error = %e,
                                    "Failed to publish assessment"
                                );
                            }

                            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

                            // Log progress every 100 transactions
                            if count % 100 == 0 {
                                let throughput = metrics.get_throughput();
                                let processing_stats = metrics.get_processing_stats();
                                info!(
                                    processed = count,
                                    throughput = format!("{:.1} tx/s", throughput),
                                    avg_latency_us = processing_stats.mean_us,
                                    "Processing milestone"
                                );
                            }
                        }
                        Err(e) => {
                            debug!(
                                transaction_id = %tx_id,
                                error = %e,
                                "Assessment rejected"
                            );
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize transaction");
                }
            }

            // Release permit when done
            drop(permit);
        });
    }

    // Print final summary
    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}
