//! One-way progress reporting. A sink that fails never stops a run.

/// Fixed points in a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Loading,
    FilesLoaded,
    KeysExtracted,
    BudgetLoaded,
    SourcesProcessed,
    NamesAttached,
    Finished,
}

impl Milestone {
    pub fn percent(&self) -> u8 {
        match self {
            Self::Loading => 0,
            Self::FilesLoaded => 20,
            Self::KeysExtracted => 40,
            Self::BudgetLoaded => 60,
            Self::SourcesProcessed => 80,
            Self::NamesAttached => 95,
            Self::Finished => 100,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Loading => "loading files",
            Self::FilesLoaded => "files loaded",
            Self::KeysExtracted => "keys extracted",
            Self::BudgetLoaded => "budget loaded",
            Self::SourcesProcessed => "sources processed",
            Self::NamesAttached => "names attached",
            Self::Finished => "report finished",
        }
    }
}

pub trait ProgressSink {
    fn report(&mut self, percent: u8, message: &str) -> Result<(), String>;
}

/// Discards every update.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8, _message: &str) -> Result<(), String> {
        Ok(())
    }
}

impl<F> ProgressSink for F
where
    F: FnMut(u8, &str) -> Result<(), String>,
{
    fn report(&mut self, percent: u8, message: &str) -> Result<(), String> {
        self(percent, message)
    }
}

/// Deliver `milestone`, logging and dropping any failure.
pub fn notify(sink: &mut dyn ProgressSink, milestone: Milestone) {
    log::debug!("progress {}%: {}", milestone.percent(), milestone.message());
    if let Err(e) = sink.report(milestone.percent(), milestone.message()) {
        log::warn!("progress sink failed at {}%: {e}", milestone.percent());
    }
}
