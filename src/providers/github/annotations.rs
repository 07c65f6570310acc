use std::time::Duration;

use log::debug;

use crate::error::Result;
use crate::insights::{ErrorAnnotation, JobRun};

use super::client::CiApi;
use super::rate_gate::RateGate;

/// Messages that say nothing about the actual defect.
///
/// The first is the generic non-zero exit notice; the second marks jobs that
/// were stopped because a sibling job failed.
pub const NOISE_MESSAGES: [&str; 2] = ["Process completed with exit code", "The job was canceled"];

pub fn is_noise(message: &str) -> bool {
    NOISE_MESSAGES.iter().any(|noise| message.contains(noise))
}

/// Fetches and filters job annotations. Every request passes the shared
/// rate gate first.
pub struct AnnotationFilter {
    gate: RateGate,
}

impl AnnotationFilter {
    pub fn new(interval: Duration) -> Self {
        let gate = RateGate::new(interval);
        debug!("Annotation requests paced at one per {:?}", gate.period());
        Self { gate }
    }

    /// Lists the annotations of `job_run_id`, drops noise, and pairs the rest
    /// with a copy of `job`.
    pub async fn filter_annotations<C: CiApi>(
        &mut self,
        client: &C,
        job_run_id: u64,
        job: &JobRun,
    ) -> Result<Vec<ErrorAnnotation>> {
        self.gate.wait().await;

        let raw = client.list_annotations(job_run_id).await?;
        let fetched = raw.len();

        let kept: Vec<ErrorAnnotation> = raw
            .into_iter()
            .filter_map(|ann| {
                let message = ann.message.unwrap_or_default();
                if is_noise(&message) {
                    return None;
                }
                Some(ErrorAnnotation {
                    job_run: job.clone(),
                    file_path: ann.path.unwrap_or_default(),
                    start_line: ann.start_line.unwrap_or(0),
                    end_line: ann.end_line.unwrap_or(0),
                    message,
                })
            })
            .collect();

        debug!(
            "Job {} ({job_run_id}): kept {} of {fetched} annotations",
            job.job_name,
            kept.len()
        );

        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CiHealthError;
    use crate::insights::Conclusion;
    use crate::providers::github::tests::{annotation, FakeApi};
    use chrono::{TimeZone, Utc};

    fn job() -> JobRun {
        JobRun {
            workflow_name: "Integration tests".to_string(),
            job_name: "kind".to_string(),
            conclusion: Conclusion::Failure,
            started_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            completed_at: None,
        }
    }

    #[test]
    fn test_is_noise() {
        assert!(is_noise("Process completed with exit code 1."));
        assert!(is_noise("The job was canceled because \"build\" failed."));
        assert!(!is_noise("linkerd check timed out"));
    }

    #[tokio::test]
    async fn test_filter_drops_noise_and_copies_job() {
        let api = FakeApi::default().with_annotations(
            42,
            vec![
                annotation("Process completed with exit code 2."),
                annotation("pod never became ready"),
                annotation("The job was canceled because \"lint\" failed."),
                annotation("checksum mismatch"),
            ],
        );
        let mut filter = AnnotationFilter::new(Duration::from_millis(1));

        let kept = filter.filter_annotations(&api, 42, &job()).await.unwrap();

        let messages: Vec<_> = kept.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(messages, vec!["pod never became ready", "checksum mismatch"]);
        assert!(kept.iter().all(|a| a.job_run == job()));
        assert_eq!(kept[0].file_path, "test/integration/install_test.go");
        assert_eq!(kept[0].start_line, 10);
        assert_eq!(kept[0].end_line, 12);
    }

    #[tokio::test]
    async fn test_filter_propagates_api_failure() {
        let api = FakeApi::default();
        let mut filter = AnnotationFilter::new(Duration::from_millis(1));

        let err = filter.filter_annotations(&api, 1, &job()).await.unwrap_err();
        assert!(matches!(err, CiHealthError::NotFound(_)));
    }
}
