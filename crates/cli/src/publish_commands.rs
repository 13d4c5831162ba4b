use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::{Context, Result},
    herald_common::AgentId,
    herald_config::HeraldConfig,
    herald_publish::{ErrorLogBuffer, EventStore, FileStore, PublishPipeline},
    herald_twitter::{HttpMediaFetcher, TwitterClient},
    tracing::info,
};

use crate::events::read_events;

/// Where outcome events are persisted.
pub fn store_path(config: &HeraldConfig) -> PathBuf {
    config
        .store
        .path
        .clone()
        .unwrap_or_else(|| herald_config::data_dir().join("events.jsonl"))
}

fn build_pipeline(
    config: &HeraldConfig,
    store: Arc<FileStore>,
    error_log: ErrorLogBuffer,
    dry_run: bool,
) -> Result<PublishPipeline> {
    let poster = Arc::new(TwitterClient::new(&config.twitter)?);
    let media = Arc::new(HttpMediaFetcher::new(Duration::from_secs(
        config.twitter.timeout_secs,
    ))?);
    let error_window =
        chrono::Duration::from_std(Duration::from_secs(config.health.error_window_secs))
            .context("health.error_window_secs is out of range")?;

    Ok(PublishPipeline::builder(AgentId(config.agent_id), config.publish.clone())
        .poster(poster)
        .media_fetcher(media)
        .store(store)
        .error_log(Arc::new(error_log))
        .error_window(error_window)
        .dry_run(dry_run)
        .build()?)
}

/// `herald run`: publish every event in the file and print one outcome per line.
pub async fn handle_run(
    config: &HeraldConfig,
    events: PathBuf,
    dry_run: bool,
    error_log: ErrorLogBuffer,
) -> Result<()> {
    let store = Arc::new(FileStore::new(store_path(config)));
    let pipeline = build_pipeline(config, store.clone(), error_log, dry_run)?;
    let events = read_events(&events)?;

    let report = pipeline.receive(events).await?;
    for outcome in &report.outcomes {
        println!("{}", serde_json::to_string(&outcome.payload)?);
    }

    eprintln!(
        "{} admitted, {} dropped, {} succeeded, {} failed{}",
        report.admitted,
        report.dropped,
        report.succeeded,
        report.failed,
        if report.dry_run {
            " (dry run)"
        } else {
            ""
        }
    );
    if !report.dry_run {
        info!(path = %store.path().display(), "outcomes recorded");
    }
    Ok(())
}

/// `herald health`: print the health report; exit 1 when unhealthy.
pub async fn handle_health(config: &HeraldConfig, error_log: ErrorLogBuffer) -> Result<()> {
    let store = Arc::new(FileStore::new(store_path(config)));
    let pipeline = build_pipeline(config, store, error_log, false)?;

    let report = pipeline.health_report(chrono::Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_healthy() {
        std::process::exit(1);
    }
    Ok(())
}

/// `herald outcomes`: print the most recent outcomes, oldest first.
pub async fn handle_outcomes(config: &HeraldConfig, limit: usize) -> Result<()> {
    let store = FileStore::new(store_path(config));
    let outcomes = store
        .list_outcomes(AgentId(config.agent_id), limit)
        .await?;
    if outcomes.is_empty() {
        eprintln!("No outcomes recorded in {}.", store.path().display());
    }
    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, herald_config::StoreConfig};

    #[test]
    fn store_path_prefers_config() {
        let config = HeraldConfig {
            store: StoreConfig {
                path: Some(PathBuf::from("/tmp/herald-test/events.jsonl")),
            },
            ..Default::default()
        };
        assert_eq!(
            store_path(&config),
            PathBuf::from("/tmp/herald-test/events.jsonl")
        );
        assert!(store_path(&HeraldConfig::default()).ends_with("events.jsonl"));
    }

    #[tokio::test]
    async fn dry_run_writes_no_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let events = dir.path().join("events.jsonl");
        std::fs::write(&events, "{\"text\": \"draft one\"}\n{\"text\": \"draft two\"}\n").unwrap();
        let config = HeraldConfig {
            store: StoreConfig {
                path: Some(dir.path().join("out.jsonl")),
            },
            ..Default::default()
        };

        handle_run(&config, events, true, ErrorLogBuffer::default())
            .await
            .unwrap();

        assert!(!dir.path().join("out.jsonl").exists());
    }

    #[tokio::test]
    async fn invalid_options_fail_before_reading_events() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HeraldConfig::default();
        config.publish.output_mode = Some("bogus".into());

        let err = handle_run(
            &config,
            dir.path().join("missing.jsonl"),
            true,
            ErrorLogBuffer::default(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("output_mode must be 'clean' or 'merge'"));
    }
}
