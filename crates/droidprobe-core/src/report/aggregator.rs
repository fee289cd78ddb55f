use chrono::Utc;
use tracing::{debug, info, warn};

use crate::collector::resolver::SourceResolver;
use crate::collector::traits::FileSystem;
use crate::probe::Probe;
use crate::report::{Report, Section, SectionOutcome};

/// Runs named probes in order and collects their outcomes into a
/// [`Report`].
///
/// Sections are isolated: a failed section is recorded and the next one
/// runs as if nothing happened.
pub struct Aggregator<'a, F: FileSystem> {
    resolver: &'a SourceResolver<F>,
    sections: Vec<(String, Probe)>,
}

impl<'a, F: FileSystem> Aggregator<'a, F> {
    pub fn new(resolver: &'a SourceResolver<F>) -> Self {
        Self {
            resolver,
            sections: Vec::new(),
        }
    }

    /// Adds a section with an explicit name.
    pub fn section(mut self, name: impl Into<String>, probe: Probe) -> Self {
        self.sections.push((name.into(), probe));
        self
    }

    /// Adds a section under the probe's default name.
    pub fn probe(self, probe: Probe) -> Self {
        let name = probe.name();
        self.section(name, probe)
    }

    pub fn run(&self) -> Report {
        let collected_at = Utc::now();
        info!(sections = self.sections.len(), "collecting report");

        let mut sections = Vec::with_capacity(self.sections.len());
        for (name, probe) in &self.sections {
            debug!(section = %name, "running probe");
            let outcome = probe.collect(self.resolver);
            match &outcome {
                SectionOutcome::Ok(data) => {
                    debug!(section = %name, provenance = ?data.provenance, degraded = data.degraded, "section ok");
                }
                SectionOutcome::Empty { .. } => {
                    debug!(section = %name, "section empty");
                }
                SectionOutcome::Failed { attempts } => {
                    warn!(section = %name, attempts = attempts.len(), "section unavailable");
                }
            }
            sections.push(Section {
                name: name.clone(),
                outcome,
            });
        }

        let usable = sections.iter().filter(|s| s.outcome.is_usable()).count();
        info!(usable, total = sections.len(), "report complete");
        Report {
            collected_at,
            sections,
        }
    }
}
