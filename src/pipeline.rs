//! Ordered, fail-fast execution of provisioning stages.

use crate::error::Result;
use crate::stages::{Stage, StageContext};
use crate::timing::Timer;

/// Stages run strictly in sequence.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Run every stage in order, stopping at the first error.
    ///
    /// Progress is printed as `[n/total] <description>`. The failing stage's
    /// error is returned unchanged; no later stage runs.
    pub fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        let total = self.stages.len();
        for (i, stage) in self.stages.iter().enumerate() {
            println!("\n[{}/{}] {}", i + 1, total, stage.description());
            let timer = Timer::start(stage.description());
            if let Err(e) = stage.run(ctx) {
                tracing::error!(stage = i + 1, error = %e, "stage failed");
                return Err(e);
            }
            timer.finish();
        }
        Ok(())
    }
}
