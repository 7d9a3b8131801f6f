//! Example: frame loop draining a job queue alongside a background worker

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use fos_jobs::{
    AmortizationWorker, JobQueue, ThreadPriority, ThreadWorker, ThreadWorkerConfig, Worker,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("fOS Jobs v{}", fos_jobs::VERSION);

    // Main-thread work, amortized over frames
    let frame_queue = JobQueue::create();
    let mut frame_worker = AmortizationWorker::new(frame_queue.clone());

    // Decoding work on a dedicated thread
    let decode_queue = JobQueue::create();
    let config = ThreadWorkerConfig::new("fos-decode")
        .with_priority(ThreadPriority::Low)
        .on_begin(|| tracing::info!("decode thread up"))
        .on_end(|| tracing::info!("decode thread down"));
    let mut decode_worker = ThreadWorker::spawn(decode_queue.clone(), config)?;

    let decoded = Arc::new(AtomicU32::new(0));
    for image in 0..16 {
        let decoded = Arc::clone(&decoded);
        let frame_queue = Arc::clone(&frame_queue);
        decode_queue.push(move || {
            decoded.fetch_add(1, Ordering::SeqCst);
            // Hand the upload back to the frame loop
            frame_queue.push(move || tracing::debug!("uploaded image {}", image));
        });
    }

    // Reserved up front, then retracted if not yet decoded
    let placeholder = decode_queue.issue_job_id();
    decode_queue.push_with_id(placeholder, || tracing::debug!("placeholder decoded"));
    decode_queue.cancel(placeholder);

    for frame in 0..4 {
        frame_worker.process(4);
        println!("frame {}: {} uploads pending", frame, frame_queue.len());
    }

    decode_worker.terminate();
    frame_worker.terminate();

    println!("Decoded {} images", decoded.load(Ordering::SeqCst));
    println!("Frame queue: {}", serde_json::to_string(&frame_queue.stats())?);
    Ok(())
}
