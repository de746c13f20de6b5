//! Sync engine: one incremental pass per database instance

use super::config::{InstanceSelection, SyncOptions};
use super::report::{CheckpointWrite, DownloadedFile, SyncReport};
use super::retry::{with_retry, RetryPolicy};
use super::{SyncError, SyncResult};
use crate::directory::{download_log_file, LogDirectory};
use crate::output::{DirectorySink, LogSink, ObjectStoreSink};
use crate::resume::{self, checkpoint_key, Checkpoint, Disposition, ResumeError};
use crate::shutdown::SharedShutdown;
use crate::store::ObjectStore;
use crate::{format_timestamp_ms, metrics};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of syncing one instance within a run
#[derive(Debug)]
pub struct InstanceOutcome {
    /// Database instance identifier
    pub instance: String,
    /// Pass report, or the error that ended the pass
    pub result: SyncResult<SyncReport>,
}

/// Orchestrates incremental sync passes
///
/// Collaborators are injected so tests can drive the engine with scripted
/// directories and in-memory stores.
pub struct SyncEngine {
    directory: Arc<dyn LogDirectory>,
    store: Arc<dyn ObjectStore>,
    options: SyncOptions,
    sink: Option<Arc<dyn LogSink>>,
    shutdown: Option<SharedShutdown>,
}

impl SyncEngine {
    /// Create an engine
    ///
    /// When the options enable archiving, the matching sink is created here:
    /// `archive_prefix` writes through `store`, `archive_dir` to local disk.
    pub fn new(
        directory: Arc<dyn LogDirectory>,
        store: Arc<dyn ObjectStore>,
        options: SyncOptions,
    ) -> Self {
        let retry = retry_policy(&options);
        let sink: Option<Arc<dyn LogSink>> = match (&options.archive_prefix, &options.archive_dir) {
            (Some(prefix), _) => Some(Arc::new(ObjectStoreSink::new(
                store.clone(),
                options.bucket.clone(),
                prefix.clone(),
                retry,
            ))),
            (None, Some(dir)) => Some(Arc::new(DirectorySink::new(dir.clone()))),
            (None, None) => None,
        };

        Self {
            directory,
            store,
            options,
            sink,
            shutdown: None,
        }
    }

    /// Replace the content sink
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Attach a shared shutdown handle for graceful cancellation
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// List instance identifiers visible in the directory
    pub async fn list_instances(&self) -> SyncResult<Vec<String>> {
        let retry = retry_policy(&self.options);
        let directory = self.directory.as_ref();
        with_retry(&retry, "DescribeDBInstances", "instances", || {
            directory.list_instances()
        })
        .await
        .map_err(SyncError::ListInstances)
    }

    /// Read the stored checkpoint of an instance
    pub async fn read_checkpoint(&self, instance: &str) -> SyncResult<Checkpoint> {
        let key = checkpoint_key(&self.options.bucket, instance);
        let retry = retry_policy(&self.options);
        resume::read_checkpoint(self.store.as_ref(), &retry, &self.options.bucket, &key)
            .await
            .map_err(|e| match e {
                ResumeError::Store(source) => SyncError::CheckpointRead {
                    bucket: self.options.bucket.clone(),
                    key: key.clone(),
                    source,
                },
                ResumeError::Corrupt { bucket, key, reason } => {
                    SyncError::CorruptCheckpoint { bucket, key, reason }
                }
            })
    }

    /// Sync the selected instances, one pass each, in listing order
    ///
    /// Fails as a whole only when instances cannot be listed or selected.
    /// Each pass outcome is reported separately; a failed pass does not stop
    /// the remaining instances unless shutdown was requested.
    pub async fn run(&self, selection: &InstanceSelection) -> SyncResult<Vec<InstanceOutcome>> {
        self.options.validate().map_err(SyncError::Configuration)?;

        let listed = self.list_instances().await?;
        info!(count = listed.len(), "Listed DB instances");

        let instances = match selection.select(&listed) {
            Some(instances) if !instances.is_empty() => instances,
            Some(_) => return Err(SyncError::NoInstances),
            None => match selection {
                InstanceSelection::Named(name) => {
                    return Err(SyncError::InstanceNotFound(name.clone()))
                }
                _ => return Err(SyncError::NoInstances),
            },
        };

        if matches!(selection, InstanceSelection::First) && listed.len() > 1 {
            info!(
                selected = %instances[0],
                skipped = listed.len() - 1,
                "Syncing only the first listed instance; use --all-instances to sync every instance"
            );
        }

        let mut outcomes = Vec::with_capacity(instances.len());
        for instance in instances {
            let result = self.sync_instance(&instance).await;
            let cancelled = matches!(result, Err(SyncError::Cancelled { .. }));
            if let Err(e) = &result {
                error!(instance = %instance, error = %e, "Sync pass failed");
            }
            outcomes.push(InstanceOutcome { instance, result });
            if cancelled {
                break;
            }
        }

        Ok(outcomes)
    }

    /// Run one pass over an instance
    ///
    /// The configured deadline ends with the last download. The checkpoint
    /// write is bounded by its own call timeout and retries, and a slow write
    /// can only turn into [`CheckpointWrite::Failed`].
    pub async fn sync_instance(&self, instance: &str) -> SyncResult<SyncReport> {
        let collected = match self.options.pass_deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.collect(instance))
                .await
                .unwrap_or_else(|_| {
                    Err(SyncError::DeadlineExceeded {
                        instance: instance.to_string(),
                        deadline,
                    })
                }),
            None => self.collect(instance).await,
        };

        let result = match collected {
            Ok(report) => self.finish(report).await,
            Err(e) => Err(e),
        };

        metrics::record_pass(instance, result.is_ok());
        result
    }

    /// Download every due file and compute the next checkpoint
    async fn collect(&self, instance: &str) -> SyncResult<SyncReport> {
        let bucket = self.options.bucket.as_str();
        let key = checkpoint_key(bucket, instance);
        let retry = retry_policy(&self.options);
        let policy = self.options.checkpoint_policy;

        info!(instance, bucket, key = %key, "Starting sync pass");

        let checkpoint = self.read_checkpoint(instance).await?;
        info!(
            instance,
            checkpoint = %checkpoint,
            captured_through = %format_timestamp_ms(checkpoint.value()),
            "Loaded checkpoint"
        );

        let directory = self.directory.as_ref();
        let files = with_retry(&retry, "DescribeDBLogFiles", instance, || {
            directory.list_log_files(instance)
        })
        .await
        .map_err(|source| SyncError::ListLogFiles {
            instance: instance.to_string(),
            source,
        })?;
        debug!(instance, count = files.len(), "Listed log files");

        let mut report = SyncReport::new(instance, key, checkpoint);
        let mut candidate = checkpoint.value();

        for file in files {
            self.ensure_running(instance)?;

            if checkpoint.classify(file.last_written) == Disposition::AlreadyCaptured {
                debug!(
                    instance,
                    file = %file.name,
                    last_written = file.last_written,
                    "Log file already downloaded, skipping"
                );
                metrics::record_file_skipped(instance);
                report.skipped.push(file.name);
                continue;
            }

            info!(
                instance,
                file = %file.name,
                last_written = file.last_written,
                "Downloading log file"
            );

            let log = download_log_file(
                directory,
                &retry,
                instance,
                &file.name,
                self.options.max_pages,
            )
            .await
            .map_err(|source| SyncError::PaginationIncomplete {
                instance: instance.to_string(),
                file: file.name.clone(),
                source,
            })?;

            let archived_to = match &self.sink {
                Some(sink) => Some(sink.write_log(instance, &file, &log.content).await.map_err(
                    |source| SyncError::Archive {
                        instance: instance.to_string(),
                        file: file.name.clone(),
                        source,
                    },
                )?),
                None => None,
            };

            metrics::record_file_downloaded(instance, log.bytes(), log.pages);
            candidate = policy.advance(candidate, file.last_written);
            report.downloaded.push(DownloadedFile {
                name: file.name,
                last_written: file.last_written,
                bytes: log.bytes(),
                pages: log.pages,
                archived_to,
            });
        }

        report.next_checkpoint = Checkpoint::new(candidate);
        Ok(report)
    }

    /// Store the next checkpoint; a failed write is recorded, not returned
    async fn finish(&self, mut report: SyncReport) -> SyncResult<SyncReport> {
        let instance = report.instance.clone();
        let instance = instance.as_str();
        self.ensure_running(instance)?;

        let previous = report.previous_checkpoint;
        let next = report.next_checkpoint;
        if next < previous {
            warn!(
                instance,
                previous = %previous,
                next = %next,
                policy = %self.options.checkpoint_policy,
                "Checkpoint moves backwards; newer files will be downloaded again next run"
            );
        }

        let retry = retry_policy(&self.options);
        let bucket = self.options.bucket.as_str();
        let written =
            resume::write_checkpoint(self.store.as_ref(), &retry, bucket, &report.checkpoint_key, next)
                .await;
        match written {
            Ok(()) => {
                metrics::record_checkpoint_write(instance, true);
                report.checkpoint_write = CheckpointWrite::Written;
            }
            Err(e) => {
                warn!(
                    instance,
                    key = %report.checkpoint_key,
                    checkpoint = %next,
                    error = %e,
                    "Failed to write checkpoint; next run will download these files again"
                );
                metrics::record_checkpoint_write(instance, false);
                report.checkpoint_write = CheckpointWrite::Failed {
                    error: e.to_string(),
                };
            }
        }

        info!(
            instance,
            downloaded = report.downloaded.len(),
            skipped = report.skipped.len(),
            bytes = report.total_bytes(),
            checkpoint = %report.next_checkpoint,
            "Sync pass complete"
        );

        Ok(report)
    }

    fn ensure_running(&self, instance: &str) -> SyncResult<()> {
        match &self.shutdown {
            Some(shutdown) if shutdown.is_shutdown_requested() => Err(SyncError::Cancelled {
                instance: instance.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

fn retry_policy(options: &SyncOptions) -> RetryPolicy {
    RetryPolicy {
        max_retries: options.max_retries,
        initial_backoff: options.initial_backoff,
        max_backoff: options.max_backoff,
        call_timeout: options.call_timeout,
    }
}
