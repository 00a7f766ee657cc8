use crate::{
    common::errors::{DiscoveryError, handle_error},
    config::RunConfig,
    workflow::{
        claim::{ClaimCoordinator, ClaimOutcome},
        discovery::Discovery,
        executor::Transcoder,
        report::{Decision, FailureKind, RunSummary},
        resolver::{Outcome, OutcomeResolver},
        types::Candidate,
    },
};
use log::info;
use std::time::Instant;

/// One pass over the source tree. Candidates are handled one at a time, in
/// discovery order. Only an unreachable source root stops the run.
pub fn run<T: Transcoder + ?Sized>(
    config: &RunConfig,
    transcoder: &T,
) -> Result<RunSummary, DiscoveryError> {
    let start_time = Instant::now();
    let discovery = Discovery::new(&config.source_root)?;
    let coordinator = ClaimCoordinator::new(&config.log_root, &config.worker_id);
    let resolver = OutcomeResolver::new(transcoder, &config.archive_root);

    info!(
        worker = coordinator.worker_id();
        "Scanning {:?}{}",
        discovery.root(),
        if config.dry_run { " (dry run)" } else { "" }
    );

    let mut summary = RunSummary::start(config.dry_run);
    for candidate in discovery.scan() {
        let decision = if config.dry_run {
            preview_candidate(&candidate, &coordinator)
        } else {
            process_candidate(&candidate, &coordinator, &resolver)
        };
        info!("{}", decision);
        summary.record(decision);
    }

    let summary = summary.finish();
    info!(
        duration = &*format!("{:?}", start_time.elapsed());
        "Run finished: {} processed, {} skipped, {} failed",
        summary.processed(),
        summary.skipped(),
        summary.failed()
    );
    Ok(summary)
}

fn process_candidate<T: Transcoder + ?Sized>(
    candidate: &Candidate,
    coordinator: &ClaimCoordinator,
    resolver: &OutcomeResolver<'_, T>,
) -> Decision {
    let path = candidate.path().to_path_buf();

    let marker = match coordinator.try_claim(candidate) {
        Ok(ClaimOutcome::Claimed(marker)) => marker,
        Ok(ClaimOutcome::AlreadyClaimed { .. }) => return Decision::SkippedAlreadyClaimed(path),
        Err(err) => {
            let err = handle_error(err.context(format!("failed to claim {:?}", path)));
            return Decision::Failed {
                path,
                kind: FailureKind::ClaimFailed,
                detail: format!("{:#}", err),
            };
        }
    };

    match resolver.resolve(candidate, &marker) {
        Ok(Outcome::Processed { .. }) => Decision::Processed(path),
        Ok(Outcome::SkippedOutputExists) => Decision::SkippedOutputExists(path),
        Ok(Outcome::Failed(failure)) => Decision::Failed {
            path,
            kind: FailureKind::TranscodeFailed,
            detail: format!("delete {} to retry", failure.marker.display()),
        },
        Err(err) => {
            let err = handle_error(err);
            Decision::Failed {
                path,
                kind: FailureKind::ArchiveFailed,
                detail: format!("{:#}", err),
            }
        }
    }
}

/// Classifies a candidate from what is on disk, changing nothing.
fn preview_candidate(candidate: &Candidate, coordinator: &ClaimCoordinator) -> Decision {
    let path = candidate.path().to_path_buf();
    if coordinator.is_claimed(candidate) {
        Decision::SkippedAlreadyClaimed(path)
    } else if candidate.output_path().exists() {
        Decision::SkippedOutputExists(path)
    } else {
        Decision::WouldProcess(path)
    }
}
