mod app;

use tracing::{error, info};

fn main() {
    let wiring = app::build_app();
    match app::run(wiring) {
        Ok(summary) => info!(
            outcome = ?summary.outcome,
            score = summary.score,
            ticks = summary.ticks,
            levels_cleared = summary.levels_cleared,
            "demo_finished"
        ),
        Err(err) => {
            error!(error = %err, "demo_failed");
            std::process::exit(1);
        }
    }
}
