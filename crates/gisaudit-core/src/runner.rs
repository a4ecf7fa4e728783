use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use gisaudit_domain::{Check, LayerRegistry};
use gisaudit_types::{CheckConfiguration, ResultAggregate};

use crate::report::{ReportOptions, ReportRenderer};

type ProgressFn<'r> = Box<dyn FnMut(usize, usize) + 'r>;
type FinishedFn<'r> = Box<dyn FnOnce(Option<&Path>) + 'r>;

struct ReportTarget<'r> {
    renderer: Box<dyn ReportRenderer + 'r>,
    destination: PathBuf,
    options: ReportOptions,
}

/// Runs a batch of check configurations against one layer registry.
///
/// `run` consumes the runner, so a batch executes once and the completion
/// callback fires exactly once.
pub struct AuditRunner<'r> {
    registry: &'r dyn LayerRegistry,
    progress: Option<ProgressFn<'r>>,
    finished: Option<FinishedFn<'r>>,
    report: Option<ReportTarget<'r>>,
}

impl<'r> AuditRunner<'r> {
    pub fn new(registry: &'r dyn LayerRegistry) -> Self {
        Self {
            registry,
            progress: None,
            finished: None,
            report: None,
        }
    }

    /// Called with `(completed, total)` after each configuration is handled.
    pub fn on_progress(mut self, f: impl FnMut(usize, usize) + 'r) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Called once when the batch is done, with the report path if a renderer was configured.
    pub fn on_finished(mut self, f: impl FnOnce(Option<&Path>) + 'r) -> Self {
        self.finished = Some(Box::new(f));
        self
    }

    pub fn with_report(
        mut self,
        renderer: Box<dyn ReportRenderer + 'r>,
        destination: impl Into<PathBuf>,
        options: ReportOptions,
    ) -> Self {
        self.report = Some(ReportTarget {
            renderer,
            destination: destination.into(),
            options,
        });
        self
    }

    pub fn run(mut self, configs: &[CheckConfiguration]) -> ResultAggregate {
        let mut aggregate = ResultAggregate::default();

        if configs.is_empty() {
            debug!("no check configurations supplied");
            if let Some(finished) = self.finished.take() {
                finished(None);
            }
            return aggregate;
        }

        let total = configs.len();
        for (i, config) in configs.iter().enumerate() {
            match Check::from_config(config, self.registry) {
                Some(check) => {
                    debug!("dispatching {} check ({}/{})", check.kind(), i + 1, total);
                    let result = check.run();
                    match result.config_error() {
                        Some(reason) => warn!("{} check degraded: {}", result.kind(), reason),
                        None => info!(
                            "{} check finished with {} error(s)",
                            result.kind(),
                            result.error_count()
                        ),
                    }
                    aggregate.push(result);
                }
                None => warn!("skipping check configuration {} of unknown type", i + 1),
            }

            if let Some(progress) = self.progress.as_mut() {
                progress(i + 1, total);
            }
        }

        let destination = self.report.take().map(|target| {
            if let Err(err) =
                target
                    .renderer
                    .generate(&target.destination, &aggregate, &target.options)
            {
                error!("failed to generate report: {}", err);
            }
            target.destination
        });

        if let Some(finished) = self.finished.take() {
            finished(destination.as_deref());
        }

        aggregate
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::report::ReportError;
    use gisaudit_testkit::fixtures;
    use gisaudit_types::{CheckKind, DuplicateConfig};

    struct FailingRenderer;

    impl ReportRenderer for FailingRenderer {
        fn generate(
            &self,
            destination: &Path,
            _aggregate: &ResultAggregate,
            _options: &ReportOptions,
        ) -> Result<(), ReportError> {
            Err(ReportError::Io {
                path: destination.to_path_buf(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    struct CountingRenderer<'a> {
        calls: &'a Cell<usize>,
        seen_results: &'a Cell<usize>,
    }

    impl ReportRenderer for CountingRenderer<'_> {
        fn generate(
            &self,
            _destination: &Path,
            aggregate: &ResultAggregate,
            _options: &ReportOptions,
        ) -> Result<(), ReportError> {
            self.calls.set(self.calls.get() + 1);
            self.seen_results.set(aggregate.total_results());
            Ok(())
        }
    }

    #[test]
    fn empty_batch_finishes_without_progress_or_report() {
        let registry = fixtures::sample_registry();
        let progress = RefCell::new(Vec::new());
        let finished = RefCell::new(Vec::new());
        let calls = Cell::new(0);
        let seen = Cell::new(0);

        let aggregate = AuditRunner::new(&registry)
            .on_progress(|i, n| progress.borrow_mut().push((i, n)))
            .on_finished(|dest| finished.borrow_mut().push(dest.map(Path::to_path_buf)))
            .with_report(
                Box::new(CountingRenderer {
                    calls: &calls,
                    seen_results: &seen,
                }),
                "report.md",
                ReportOptions::default(),
            )
            .run(&[]);

        assert!(aggregate.is_empty());
        assert!(progress.borrow().is_empty());
        assert_eq!(*finished.borrow(), vec![None]);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn progress_counts_every_configuration() {
        let registry = fixtures::sample_registry();
        let mut configs = fixtures::sample_configs();
        configs.insert(1, CheckConfiguration::Unknown);
        let progress = RefCell::new(Vec::new());

        let aggregate = AuditRunner::new(&registry)
            .on_progress(|i, n| progress.borrow_mut().push((i, n)))
            .run(&configs);

        assert_eq!(*progress.borrow(), vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
        assert_eq!(aggregate.total_results(), 3);
        for kind in CheckKind::ALL {
            assert_eq!(aggregate.len(kind), 1);
            assert_eq!(aggregate.error_count(kind), 1);
        }
    }

    #[test]
    fn renderer_sees_full_aggregate_and_completion_gets_destination() {
        let registry = fixtures::sample_registry();
        let calls = Cell::new(0);
        let seen = Cell::new(0);
        let finished = RefCell::new(Vec::new());

        AuditRunner::new(&registry)
            .on_finished(|dest| finished.borrow_mut().push(dest.map(Path::to_path_buf)))
            .with_report(
                Box::new(CountingRenderer {
                    calls: &calls,
                    seen_results: &seen,
                }),
                "out/report.md",
                ReportOptions::default(),
            )
            .run(&fixtures::sample_configs());

        assert_eq!(calls.get(), 1);
        assert_eq!(seen.get(), 3);
        assert_eq!(*finished.borrow(), vec![Some(PathBuf::from("out/report.md"))]);
    }

    #[test]
    fn renderer_failure_still_finishes() {
        let registry = fixtures::sample_registry();
        let finished = RefCell::new(Vec::new());

        let aggregate = AuditRunner::new(&registry)
            .on_finished(|dest| finished.borrow_mut().push(dest.map(Path::to_path_buf)))
            .with_report(
                Box::new(FailingRenderer),
                "report.json",
                ReportOptions::default(),
            )
            .run(&fixtures::sample_configs());

        assert_eq!(aggregate.total_results(), 3);
        assert_eq!(*finished.borrow(), vec![Some(PathBuf::from("report.json"))]);
    }

    #[test]
    fn completion_without_renderer_gets_none() {
        let registry = fixtures::sample_registry();
        let finished = RefCell::new(Vec::new());

        AuditRunner::new(&registry)
            .on_finished(|dest| finished.borrow_mut().push(dest.map(Path::to_path_buf)))
            .run(&fixtures::sample_configs());

        assert_eq!(*finished.borrow(), vec![None]);
    }

    #[test]
    fn degraded_checks_are_aggregated() {
        let registry = fixtures::sample_registry();
        let configs = [
            CheckConfiguration::Duplicate(DuplicateConfig {
                layer_id: "missing".to_string(),
                field_name: "pin".to_string(),
            }),
            CheckConfiguration::Duplicate(DuplicateConfig {
                layer_id: "parcels".to_string(),
                field_name: "nope".to_string(),
            }),
        ];

        let aggregate = AuditRunner::new(&registry).run(&configs);

        assert_eq!(aggregate.len(CheckKind::Duplicate), 2);
        assert_eq!(aggregate.degraded_count(), 2);
        assert_eq!(aggregate.total_errors(), 0);
        assert_eq!(aggregate.duplicate[0].layer_name, "Invalid Layer");
    }
}
