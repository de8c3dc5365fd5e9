// ABOUTME: Rehearse command implementation.
// ABOUTME: Runs the whole pipeline against an in-memory lab; ctrl-c cancels the build.

use std::sync::Arc;

use labforge::config::Config;
use labforge::error::Result;
use labforge::output::Output;
use labforge::pipeline::{Reporter, run_build};
use labforge::remote::memory::MemoryLab;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn rehearse(config: Config, pending_polls: u32, mut output: Output) -> Result<()> {
    output.start_timer();

    let lab = MemoryLab::new(&config.location).with_pending_polls(pending_polls);
    // The lab has no gallery images of its own; provide the configured one.
    if let Some(gallery) = &config.gallery {
        lab.seed_gallery_image(&gallery.image_id(&config.subscription_id), config.os_type);
    }
    let lab = Arc::new(lab);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signal_task = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, cancelling build");
                on_signal.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    let output = Arc::new(output);
    let reporter: Arc<dyn Reporter> = output.clone();
    let result = run_build(config, lab, reporter, &cancel).await;
    signal_task.abort();

    let report = result?;
    for warning in report.diagnostics.warnings() {
        output.warning(warning);
    }
    output.result(&report.artifact);
    output.success("Rehearsal complete");
    Ok(())
}
