//! Gestura Synthetic Feed Demo
//!
//! Runs the full pipeline without a camera:
//! - Synthetic two-hand motion at 30 frames per second
//! - Real HTTP transport to a recognizer (or an in-process stub)
//! - Recognitions, expiries and server status printed as they arrive
//!
//! Usage: `synthetic-feed [host:port] [--stub] [--frames N] [--front] [--json]`

use std::time::Duration;

use gestura_core::{PipelineConfig, ServerConfig};
use gestura_runtime::{init_telemetry, CycleOutcome, Pipeline, PipelineEvent, TelemetryConfig};
use gestura_test::{RecognizerStub, SyntheticConfig, SyntheticHands};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

struct Args {
    server: Option<ServerConfig>,
    stub: bool,
    frames: usize,
    front: bool,
    json: bool,
}

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let mut args = Args {
        server: None,
        stub: false,
        frames: 300,
        front: false,
        json: false,
    };

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--stub" => args.stub = true,
            "--front" => args.front = true,
            "--json" => args.json = true,
            "--frames" => {
                let n = it.next().ok_or("--frames needs a value")?;
                args.frames = n.parse()?;
            }
            other => args.server = Some(ServerConfig::parse(other)?),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;

    let telemetry = TelemetryConfig {
        json: args.json,
        ..TelemetryConfig::default()
    };
    init_telemetry(&telemetry)?;

    // Keep the stub alive for the whole run
    let stub = if args.stub {
        let stub = RecognizerStub::start().await?;
        stub.set_gesture("hello", 0.92, 1);
        Some(stub)
    } else {
        None
    };

    let server = match (&stub, args.server) {
        (Some(stub), _) => stub.server_config(),
        (None, Some(server)) => server,
        (None, None) => ServerConfig::default(),
    };

    println!("Gestura synthetic feed");
    println!("  recognizer: {}", server.url());
    println!("  frames:     {}", args.frames);
    println!("  camera:     {}", if args.front { "front" } else { "back" });
    println!();

    let config = PipelineConfig::default().with_server(server);
    let (pipeline, mut events) = Pipeline::connect(config, tokio::runtime::Handle::current())?;

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                PipelineEvent::Recognized(r) => {
                    println!("> {} ({:.0}%, class {})", r.gesture, r.confidence * 100.0, r.class_id)
                }
                PipelineEvent::Expired => println!("  (cleared)"),
                PipelineEvent::Reset => println!("  (reset)"),
                PipelineEvent::ServerStatus(true) => println!("  recognizer reachable"),
                PipelineEvent::ServerStatus(false) => println!("  recognizer unreachable"),
            }
        }
    });

    let mut hands = SyntheticHands::new(
        SyntheticConfig {
            front_camera: args.front,
            ..SyntheticConfig::signing()
        },
        rand::random(),
    );

    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    let mut dispatched = 0usize;
    for _ in 0..args.frames {
        ticker.tick().await;
        if pipeline.on_detection(&hands.next_detection()) == CycleOutcome::Dispatched {
            dispatched += 1;
        }
    }

    // Let the last transmission finish
    tokio::time::sleep(Duration::from_secs(1)).await;

    let stats = pipeline.stats();
    let transport = pipeline.transport_stats();
    println!();
    println!("Windows dispatched: {dispatched}");
    println!("Deferred windows:   {}", stats.deferred);
    println!("Gestures shown:     {}", stats.recognized);
    println!("Failed submissions: {}", stats.failed_submissions);
    println!("HTTP attempts:      {} ({} busy)", transport.attempts, transport.busy_replies);

    pipeline.shutdown();
    printer.abort();
    tracing::debug!("demo finished");
    Ok(())
}
