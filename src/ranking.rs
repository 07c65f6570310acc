use std::collections::HashMap;

use indexmap::IndexSet;

use crate::insights::{ErrorAnnotation, JobRun, RankedPair, WorkflowSummary};

/// Label of the row that absorbs every job with a perfect success rate.
pub const OTHERS_LABEL: &str = "Others";

/// Orders a frequency map by value, ascending unless `reverse` is set.
///
/// Equal values are ordered by key so the output is reproducible.
pub fn rank_by_value(freqs: HashMap<String, u32>, reverse: bool) -> Vec<RankedPair> {
    let mut ranked: Vec<RankedPair> = freqs
        .into_iter()
        .map(|(key, value)| RankedPair::new(key, value))
        .collect();

    ranked.sort_by(|a, b| {
        let by_value = if reverse {
            b.value.cmp(&a.value)
        } else {
            a.value.cmp(&b.value)
        };
        by_value.then_with(|| a.key.cmp(&b.key))
    });

    ranked
}

#[derive(Default, Clone, Copy)]
struct Tally {
    total: u64,
    successes: u64,
}

impl Tally {
    fn record(&mut self, run: &JobRun) {
        self.total += 1;
        if run.conclusion.is_success() {
            self.successes += 1;
        }
    }

    fn is_perfect(self) -> bool {
        self.total > 0 && self.successes == self.total
    }
}

#[allow(clippy::cast_possible_truncation)]
fn percent(count: u64, total: u64) -> u32 {
    if total == 0 {
        0
    } else {
        // count <= total, so the quotient is at most 100
        (count * 100 / total) as u32
    }
}

fn tally_by<'a, F>(runs: &'a [JobRun], key: F) -> HashMap<&'a str, Tally>
where
    F: Fn(&'a JobRun) -> &'a str,
{
    runs.iter().fold(HashMap::new(), |mut tallies, run| {
        tallies.entry(key(run)).or_insert_with(Tally::default).record(run);
        tallies
    })
}

/// Success rate per job name, least successful first.
///
/// Jobs that never failed are collapsed into a single `Others` row fixed at 100.
pub fn job_success_rates(runs: &[JobRun]) -> Vec<RankedPair> {
    let mut rates: HashMap<String, u32> = HashMap::new();
    let mut any_perfect = false;

    for (job, tally) in tally_by(runs, |run| run.job_name.as_str()) {
        if tally.is_perfect() {
            any_perfect = true;
        } else {
            rates.insert(job.to_string(), percent(tally.successes, tally.total));
        }
    }

    if any_perfect {
        rates.insert(OTHERS_LABEL.to_string(), 100);
    }

    rank_by_value(rates, false)
}

/// Global success rate plus the per-workflow rates, least successful first.
pub fn workflow_success_rates(runs: &[JobRun]) -> (u32, Vec<RankedPair>) {
    if runs.is_empty() {
        return (0, Vec::new());
    }

    let global = runs.iter().fold(Tally::default(), |mut tally, run| {
        tally.record(run);
        tally
    });

    let rates = tally_by(runs, |run| run.workflow_name.as_str())
        .into_iter()
        .map(|(workflow, tally)| (workflow.to_string(), percent(tally.successes, tally.total)))
        .collect();

    (
        percent(global.successes, global.total),
        rank_by_value(rates, false),
    )
}

/// How often each failure message appeared in `workflow`, most frequent first.
pub fn workflow_messages(workflow: &str, annotations: &[ErrorAnnotation]) -> Vec<RankedPair> {
    let counts = annotations
        .iter()
        .filter(|ann| ann.job_run.workflow_name == workflow)
        .fold(HashMap::new(), |mut counts, ann| {
            *counts.entry(ann.message.clone()).or_insert(0) += 1;
            counts
        });

    rank_by_value(counts, true)
}

pub fn workflow_slug(name: &str) -> String {
    name.replace(' ', "-")
}

/// One summary per workflow that produced annotations, in first-seen order.
pub fn workflow_summaries(annotations: &[ErrorAnnotation]) -> Vec<WorkflowSummary> {
    let workflows: IndexSet<&str> = annotations
        .iter()
        .map(|ann| ann.job_run.workflow_name.as_str())
        .collect();

    workflows
        .into_iter()
        .map(|name| WorkflowSummary {
            id: workflow_slug(name),
            name: name.to_string(),
            messages: workflow_messages(name, annotations),
        })
        .collect()
}
