//! Property tests for the numeric invariants of batch progress.

use iconesign::domain::models::workflow::{merge_snapshot, overall_progress};
use iconesign::domain::models::{
    BatchSummary, FileHandle, FileProgress, FileStage, FileStatus, ProgressSnapshot,
    WorkflowEvent, WorkflowFile, WorkflowState,
};
use proptest::prelude::*;

fn file_with_progress(i: usize, progress: u8) -> WorkflowFile {
    let mut file = WorkflowFile::new(FileHandle::new(format!("f{i}.xml"), 1));
    file.progress = progress;
    file
}

const STATUSES: [&str; 4] = ["PENDING", "PROCESSING", "COMPLETED", "FAILED"];

const LOCAL_STATUSES: [FileStatus; 4] = [
    FileStatus::Pending,
    FileStatus::Processing,
    FileStatus::Completed,
    FileStatus::Error,
];

const STAGES: [FileStage; 7] = [
    FileStage::Upload,
    FileStage::Sign,
    FileStage::Save,
    FileStage::Validate,
    FileStage::Transform,
    FileStage::Package,
    FileStage::Complete,
];

fn terminal_batch(statuses: &[bool], completed: bool) -> WorkflowState {
    let files: Vec<_> = (0..statuses.len())
        .map(|i| WorkflowFile::new(FileHandle::new(format!("f{i}.xml"), 1)))
        .collect();
    let snapshot = ProgressSnapshot {
        session_id: Some("s".to_string()),
        status: if completed { "COMPLETED" } else { "FAILED" }.to_string(),
        message: None,
        files: statuses
            .iter()
            .enumerate()
            .map(|(i, ok)| FileProgress {
                filename: format!("f{i}.xml"),
                status: if *ok { "COMPLETED" } else { "FAILED" }.to_string(),
                progress: Some(if *ok { 100.0 } else { 30.0 }),
                ..FileProgress::default()
            })
            .collect(),
        zip_download_url: None,
    };

    WorkflowState::default()
        .reduce(WorkflowEvent::FilesAdded(files))
        .reduce(WorkflowEvent::ProcessingStarted)
        .reduce(WorkflowEvent::SubmissionAccepted { session_id: "s".to_string() })
        .reduce(WorkflowEvent::SnapshotReceived(snapshot))
}

proptest! {
    /// Overall progress is the rounded mean and never leaves its bounds.
    #[test]
    fn prop_overall_progress_is_bounded_mean(values in prop::collection::vec(0u8..=100, 1..40)) {
        let files: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, p)| file_with_progress(i, *p))
            .collect();
        let overall = overall_progress(&files);

        let min = *values.iter().min().unwrap();
        let max = *values.iter().max().unwrap();
        prop_assert!(overall >= min && overall <= max);

        let mean = values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64;
        prop_assert!((f64::from(overall) - mean).abs() <= 0.5 + f64::EPSILON);
    }

    /// Terminal results never count more files than the batch holds.
    #[test]
    fn prop_result_counts_sum_to_at_most_total(
        statuses in prop::collection::vec(0usize..4, 1..20),
        completed in any::<bool>(),
    ) {
        let files: Vec<_> = (0..statuses.len())
            .map(|i| WorkflowFile::new(FileHandle::new(format!("f{i}.xml"), 1)))
            .collect();
        let snapshot = ProgressSnapshot {
            session_id: Some("s".to_string()),
            status: if completed { "COMPLETED" } else { "FAILED" }.to_string(),
            message: None,
            files: statuses
                .iter()
                .enumerate()
                .map(|(i, s)| FileProgress {
                    filename: format!("f{i}.xml"),
                    status: STATUSES[*s].to_string(),
                    progress: Some(50.0),
                    ..FileProgress::default()
                })
                .collect(),
            zip_download_url: None,
        };

        let state = WorkflowState::default()
            .reduce(WorkflowEvent::FilesAdded(files))
            .reduce(WorkflowEvent::ProcessingStarted)
            .reduce(WorkflowEvent::SubmissionAccepted { session_id: "s".to_string() })
            .reduce(WorkflowEvent::SnapshotReceived(snapshot));

        let results = state.results.expect("terminal snapshot yields results");
        prop_assert_eq!(results.total_files, statuses.len());
        prop_assert!(results.successful_files + results.failed_files <= results.total_files);
        prop_assert_eq!(results.success, completed);
        prop_assert!(results.success_rate() <= 100);
    }

    /// Once every file has an outcome, the two counts cover the whole batch.
    #[test]
    fn prop_all_terminal_counts_sum_to_total(
        outcomes in prop::collection::vec(any::<bool>(), 1..20),
        completed in any::<bool>(),
    ) {
        let state = terminal_batch(&outcomes, completed);
        let results = state.results.expect("terminal snapshot yields results");

        prop_assert_eq!(results.successful_files + results.failed_files, results.total_files);
        prop_assert_eq!(results.successful_files, outcomes.iter().filter(|ok| **ok).count());
    }

    /// Entries whose names match no local file change nothing.
    #[test]
    fn prop_unmatched_entries_leave_files_untouched(
        locals in prop::collection::vec((0usize..4, 0usize..7, 0u8..=100), 1..12),
        foreign in prop::collection::vec(("[a-z]{1,8}", 0usize..4, 0usize..7, 0.0f64..=100.0), 0..12),
    ) {
        let mut files: Vec<_> = locals
            .iter()
            .enumerate()
            .map(|(i, (status, stage, progress))| {
                let mut file = WorkflowFile::new(FileHandle::new(format!("local-{i}.xml"), 1));
                file.status = LOCAL_STATUSES[*status];
                file.stage = STAGES[*stage];
                file.progress = *progress;
                file
            })
            .collect();
        let before = files.clone();

        let snapshot = ProgressSnapshot {
            status: "PROCESSING".to_string(),
            files: foreign
                .iter()
                .map(|(name, status, stage, progress)| FileProgress {
                    filename: format!("remote-{name}.xml"),
                    status: STATUSES[*status].to_string(),
                    stage: Some(STAGES[*stage].to_string()),
                    progress: Some(*progress),
                    ..FileProgress::default()
                })
                .collect(),
            ..ProgressSnapshot::default()
        };
        merge_snapshot(&mut files, &snapshot);

        prop_assert_eq!(files, before);
    }

    /// Batch-sign failures follow the weakest step.
    #[test]
    fn prop_batch_summary_failed_bounds(
        total in 0usize..50,
        signed in 0usize..50,
        saved in 0usize..50,
        validated in 0usize..50,
    ) {
        let signed = signed.min(total);
        let saved = saved.min(signed);
        let validated = validated.min(signed);
        let summary = BatchSummary::compute(total, signed, saved, validated);

        prop_assert!(summary.failed <= total);
        prop_assert_eq!(summary.failed, total - signed.min(saved).min(validated));
    }
}
