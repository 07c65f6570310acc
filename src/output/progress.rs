use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Progress tracking for the fetch and ranking phases
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_phase_1() -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        let pb = create_spinner(bright_yellow("Phase 1/2: Fetching workflow runs").to_string());
        Self { pb }
    }

    pub fn finish_phase_1_start_phase_2(self, job_count: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 1/2: Fetched {job_count} job runs ✓")).to_string(),
        );
        let pb = create_spinner(bright_yellow("Phase 2/2: Ranking results").to_string());
        Self { pb }
    }

    pub fn finish_phase_2(self) {
        self.pb
            .finish_with_message(bright_green("Phase 2/2: Rankings computed ✓").to_string());
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_spinner().template("  {msg} {spinner}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
