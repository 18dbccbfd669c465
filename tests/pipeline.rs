use std::fs;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::SecretString;
use tempfile::TempDir;

use docgen::llm::TransportResponse;
use docgen::orchestrator::{MANIFEST_FILE, READTHEDOCS_MANIFEST};
use docgen::{DocgenError, EndpointClient, Orchestrator, Result, RunConfig, Transport};

/// Topics first, file names second, `content-X` for everything after.
struct DemoEndpoint {
    calls: Mutex<Vec<serde_json::Value>>,
}

#[async_trait]
impl Transport for DemoEndpoint {
    async fn post(
        &self,
        _url: &str,
        headers: &[(&'static str, String)],
        body: Vec<u8>,
    ) -> Result<TransportResponse> {
        assert!(headers.contains(&("Authorization", "Bearer demo-key".to_string())));

        let mut calls = self.calls.lock().unwrap();
        calls.push(serde_json::from_slice(&body).unwrap());
        let output = match calls.len() {
            1 => "topicA\ntopicB",
            2 => "a.rst\nb.rst",
            _ => "content-X",
        };
        Ok(TransportResponse {
            status: 200,
            headers: Vec::new(),
            body: serde_json::json!({ "output": output }).to_string(),
        })
    }
}

fn setup(temp: &Path) -> RunConfig {
    let out = temp.join("out");
    let root = temp.join("root");
    fs::create_dir(&out).unwrap();
    fs::create_dir(&root).unwrap();
    let prompt_file = temp.join("topics_files_request.txt");
    fs::write(&prompt_file, "Suggest documentation topics for {repository_name}.").unwrap();

    RunConfig {
        directory: out,
        root_directory: root,
        repository_name: "demo".to_string(),
        prompt_file,
    }
}

#[tokio::test]
async fn generates_every_file_end_to_end() {
    let temp = TempDir::new().unwrap();
    let config = setup(temp.path());
    let client = EndpointClient::new(
        DemoEndpoint {
            calls: Mutex::new(Vec::new()),
        },
        Some(SecretString::from("demo-key".to_string())),
        "https://example.test/score",
    );
    let orchestrator = Orchestrator::new(client, config.clone());

    let report = orchestrator.run().await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.written.len(), 5);

    let out = &config.directory;
    assert_eq!(fs::read_to_string(out.join("a.rst")).unwrap(), "content-X");
    assert_eq!(fs::read_to_string(out.join("b.rst")).unwrap(), "content-X");
    assert_eq!(fs::read_to_string(out.join("conf.py")).unwrap(), "content-X");
    assert_eq!(fs::read_to_string(out.join("index.rst")).unwrap(), "content-X");
    assert_eq!(
        fs::read_to_string(config.root_directory.join(MANIFEST_FILE)).unwrap(),
        READTHEDOCS_MANIFEST
    );

    let calls = orchestrator.client().transport().calls.lock().unwrap();
    assert_eq!(calls.len(), 6);
    assert_eq!(
        calls[0],
        serde_json::json!({
            "question": "Suggest documentation topics for demo.",
            "search": "demo"
        })
    );
}

#[tokio::test]
async fn missing_key_never_reaches_the_endpoint() {
    let temp = TempDir::new().unwrap();
    let config = setup(temp.path());
    let client = EndpointClient::new(
        DemoEndpoint {
            calls: Mutex::new(Vec::new()),
        },
        None,
        "https://example.test/score",
    );
    let orchestrator = Orchestrator::new(client, config.clone());

    let err = orchestrator.run().await.unwrap_err();
    assert!(matches!(err, DocgenError::Configuration(_)));
    assert!(orchestrator.client().transport().calls.lock().unwrap().is_empty());
    assert!(fs::read_dir(&config.directory).unwrap().next().is_none());
}

#[test]
fn manifest_text_is_exact() {
    assert_eq!(
        READTHEDOCS_MANIFEST,
        "version: 2\n\
         build: {os: ubuntu-20.04, tools: {python: \"3.8\"}}\n\
         sphinx: {builder: html, configuration: python/docs/conf.py}\n\
         python: {install: [{requirements: requirements-doc.txt}, {method: pip, path: python}]}\n\
         formats: [epub, pdf]\n"
    );
}
