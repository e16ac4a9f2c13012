use super::evolution_engine::{GenerationStats, ProgressCallback};
use std::sync::mpsc::Sender;

/// Reports progress through the `log` facade
#[derive(Debug, Default)]
pub struct LoggingProgressCallback;

impl ProgressCallback for LoggingProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        log::debug!("Generation {} starting...", generation + 1);
    }

    fn on_individuals_evaluated(&mut self, evaluated: usize, total: usize) {
        log::debug!("  Evaluated {}/{} individuals", evaluated, total);
    }

    fn on_generation_complete(&mut self, stats: &GenerationStats) {
        log::info!(
            "Generation {} complete. Best fitness: {:?}, mean size: {:.1}, mean height: {:.1}",
            stats.generation + 1,
            stats.best_fitness,
            stats.mean_size,
            stats.mean_height
        );
    }
}

/// Messages sent by [`ChannelProgressCallback`]
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    GenerationStart(usize),
    IndividualsEvaluated { evaluated: usize, total: usize },
    GenerationComplete(GenerationStats),
}

/// Forwards progress to another thread. A closed receiver is ignored.
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_individuals_evaluated(&mut self, evaluated: usize, total: usize) {
        let _ = self
            .sender
            .send(ProgressMessage::IndividualsEvaluated { evaluated, total });
    }

    fn on_generation_complete(&mut self, stats: &GenerationStats) {
        let _ = self
            .sender
            .send(ProgressMessage::GenerationComplete(stats.clone()));
    }
}
