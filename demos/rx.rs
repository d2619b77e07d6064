//! Receive a few scripted blocks from the dummy backend and print their
//! metadata. Run with `RUST_LOG=debug` to see the session log.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use iqpump::DeviceSession;
use iqpump::Dummy;
use iqpump::SampleFifo;
use iqpump::SessionConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;

    let config = SessionConfig {
        device_args: "driver=dummy, reads='4096 4096 4096 4096'".to_string(),
        ..SessionConfig::default()
    };

    let fifo = SampleFifo::new(8, 131_072, 0);
    let mut session = DeviceSession::<Dummy>::new(config);
    session.start()?;
    session.run(&fifo, &shutdown);
    session.close();

    while let Some(block) = fifo.dequeue() {
        println!(
            "block @ {} ({} samples, level {:.4}, power {:.4}{})",
            block.sample_timestamp,
            block.valid_len,
            block.mean_level,
            block.mean_power,
            if block.discontinuous {
                format!(", {} dropped", block.dropped)
            } else {
                String::new()
            }
        );
        fifo.release(block);
    }
    Ok(())
}
