//! The documentation pipeline.
//!
//! Steps run strictly in order:
//! 1. ask for the documentation topics
//! 2. ask for one file name per topic
//! 3. generate each page, pairing file names and topics by position
//! 4. generate `conf.py` and `index.rst`
//! 5. write the Read-the-Docs manifest (no request involved)
//!
//! Steps 1 and 2 abort the run on failure since nothing after them can work.
//! Any other failure is recorded in the [`RunReport`] and the run continues.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{DocgenError, Result};
use crate::llm::{EndpointClient, Request, Transport};
use crate::prompts;
use crate::writer;

pub const MANIFEST_FILE: &str = ".readthedocs.yaml";

pub const READTHEDOCS_MANIFEST: &str = r#"version: 2
build: {os: ubuntu-20.04, tools: {python: "3.8"}}
sphinx: {builder: html, configuration: python/docs/conf.py}
python: {install: [{requirements: requirements-doc.txt}, {method: pip, path: python}]}
formats: [epub, pdf]
"#;

/// Where the pipeline reads its template and writes its output.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub directory: PathBuf,
    pub root_directory: PathBuf,
    pub repository_name: String,
    pub prompt_file: PathBuf,
}

impl From<&Settings> for RunConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            directory: settings.directory.clone(),
            root_directory: settings.root_directory.clone(),
            repository_name: settings.repository_name.clone(),
            prompt_file: settings.prompt_file.clone(),
        }
    }
}

#[derive(Debug)]
pub struct Failure {
    pub target: String,
    pub error: DocgenError,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<Failure>,
    pub pages_requested: usize,
    pub cancelled: bool,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    fn record(&mut self, target: &str, outcome: Result<PathBuf>) -> Result<()> {
        match outcome {
            Ok(path) => self.written.push(path),
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                warn!(file = target, error = %error, "Skipping file");
                self.failures.push(Failure {
                    target: target.to_string(),
                    error,
                });
            }
        }
        Ok(())
    }
}

/// Pair file names with topics by position.
///
/// The endpoint is not guaranteed to return as many file names as topics;
/// extra entries on either side are dropped.
pub fn pair<'a>(file_names: &'a [String], topics: &'a [String]) -> Vec<(&'a str, &'a str)> {
    if file_names.len() != topics.len() {
        warn!(
            file_names = file_names.len(),
            topics = topics.len(),
            "File name and topic counts differ; extra entries are ignored"
        );
    }
    file_names
        .iter()
        .zip(topics)
        .map(|(file_name, topic)| (file_name.as_str(), topic.as_str()))
        .collect()
}

pub struct Orchestrator<T> {
    client: EndpointClient<T>,
    config: RunConfig,
    cancel: CancellationToken,
}

impl<T: Transport> Orchestrator<T> {
    pub fn new(client: EndpointClient<T>, config: RunConfig) -> Self {
        Self {
            client,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Checked between steps; a cancelled run stops before the next request.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn client(&self) -> &EndpointClient<T> {
        &self.client
    }

    pub async fn run(&self) -> Result<RunReport> {
        let name = self.config.repository_name.as_str();
        let template = prompts::load_topics_template(&self.config.prompt_file)?;
        let mut report = RunReport::default();

        info!(repository = name, "Requesting documentation topics");
        let topics = self
            .client
            .invoke(&prompts::topics_request(&template, name))
            .await?;
        let topics = prompts::split_output(&topics.output);

        info!(topics = topics.len(), "Requesting file names");
        let file_names = self
            .client
            .invoke(&prompts::file_names_request(name, &topics))
            .await?;
        let file_names = prompts::split_output(&file_names.output);

        for (file_name, topic) in pair(&file_names, &topics) {
            if self.stop_requested(&mut report) {
                return Ok(report);
            }
            report.pages_requested += 1;
            info!(file = file_name, topic, "Generating page");
            let request = prompts::file_request(name, file_name, topic);
            let outcome = self.generate(&request, file_name).await;
            report.record(file_name, outcome)?;
        }

        let auxiliary = [
            ("conf.py", prompts::conf_py_request(name)),
            ("index.rst", prompts::index_request(name, &file_names)),
        ];
        for (file_name, request) in &auxiliary {
            if self.stop_requested(&mut report) {
                return Ok(report);
            }
            info!(file = file_name, "Generating auxiliary file");
            let outcome = self.generate(request, file_name).await;
            report.record(file_name, outcome)?;
        }

        if self.stop_requested(&mut report) {
            return Ok(report);
        }
        let outcome = writer::write(
            &self.config.root_directory,
            MANIFEST_FILE,
            READTHEDOCS_MANIFEST,
        );
        report.record(MANIFEST_FILE, outcome)?;

        Ok(report)
    }

    async fn generate(&self, request: &Request, file_name: &str) -> Result<PathBuf> {
        let response = self.client.invoke(request).await?;
        writer::write(&self.config.directory, file_name, &response.output)
    }

    fn stop_requested(&self, report: &mut RunReport) -> bool {
        if self.cancel.is_cancelled() {
            warn!("Run cancelled; remaining files were not generated");
            report.cancelled = true;
        }
        report.cancelled
    }
}
