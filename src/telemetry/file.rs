use crate::error::{DirectError, Result};
use crate::telemetry::Telemetry;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const VIEWS_FILE: &str = "views";
const QUERIES_FILE: &str = "queries.log";

/// Telemetry kept in two plain files: a view counter and a query log
#[derive(Debug)]
pub struct FileTelemetry {
    dir: PathBuf,
    // Serializes read-increment-write of the counter within this process
    counter_lock: Mutex<()>,
}

impl FileTelemetry {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            counter_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current view count, 0 if never recorded
    pub async fn views(&self) -> Result<u64> {
        let path = self.dir.join(VIEWS_FILE);
        if !fs::try_exists(&path).await? {
            return Ok(0);
        }

        let content = fs::read_to_string(&path).await?;
        content
            .trim()
            .parse()
            .map_err(|e| DirectError::Telemetry(format!("Corrupt view counter: {e}")))
    }

    /// Recorded queries, oldest first, without timestamps
    pub async fn queries(&self) -> Result<Vec<String>> {
        let path = self.dir.join(QUERIES_FILE);
        if !fs::try_exists(&path).await? {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        Ok(content
            .lines()
            .filter_map(|line| line.split_once('\t').map(|(_, query)| query.to_string()))
            .collect())
    }
}

#[async_trait]
impl Telemetry for FileTelemetry {
    async fn record_page_load(&self) -> Result<()> {
        let _guard = self.counter_lock.lock().await;
        fs::create_dir_all(&self.dir).await?;

        let views = self.views().await? + 1;

        // Write to temporary file, then atomic rename
        let path = self.dir.join(VIEWS_FILE);
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, views.to_string()).await?;
        fs::rename(&tmp_path, &path).await?;

        tracing::debug!("Recorded page load ({views} total)");
        Ok(())
    }

    async fn record_query(&self, query: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        // One line per query; tabs and newlines inside the query are flattened
        let flattened: String = query
            .chars()
            .map(|c| if c == '\t' || c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        let line = format!("{}\t{flattened}\n", chrono::Utc::now().to_rfc3339());

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(QUERIES_FILE))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!("Recorded query: {flattened}");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
