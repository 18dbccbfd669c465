//! Prompt construction for each step of the pipeline.
//!
//! All builders are pure: they take the repository name plus whatever the
//! earlier steps produced and return the [`Request`] to send.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::{DocgenError, Result};
use crate::llm::Request;

pub const REPOSITORY_PLACEHOLDER: &str = "{repository_name}";

/// Shown to the endpoint so it answers with bare filenames, one per line.
pub const SAMPLE_RST_FILES: [&str; 9] = [
    "contributing.rst",
    "explainers.rst",
    "importances.rst",
    "index.rst",
    "notebooks.rst",
    "overview.rst",
    "transformations.rst",
    "usage.rst",
    "visualizations.rst",
];

pub const CONF_PY_EXAMPLE_URL: &str =
    "https://github.com/sphinx-doc/sphinx/blob/master/doc/conf.py";

pub fn load_topics_template(path: &Path) -> Result<String> {
    let template = fs::read_to_string(path).map_err(|e| {
        DocgenError::config(format!(
            "cannot read topics prompt template {}: {}",
            path.display(),
            e
        ))
    })?;

    if !template.contains(REPOSITORY_PLACEHOLDER) {
        warn!(
            path = %path.display(),
            "Topics template has no {} placeholder; it will be sent unchanged",
            REPOSITORY_PLACEHOLDER
        );
    }
    Ok(template)
}

pub fn topics_request(template: &str, repository_name: &str) -> Request {
    Request::new(template.replace(REPOSITORY_PLACEHOLDER, repository_name))
        .with_search(repository_name)
}

pub fn file_names_request(repository_name: &str, topics: &[String]) -> Request {
    let question = format!(
        "Generate the rst file names for the {} repository from the topics below. \
         Answer with one file name per line and do not number them.\n{}\nExample:\n{}",
        repository_name,
        topics.join("\n"),
        SAMPLE_RST_FILES.join("\n")
    );
    Request::new(question).with_search(repository_name)
}

pub fn file_request(repository_name: &str, filename: &str, topic: &str) -> Request {
    let question = format!(
        "Generate the {} file for the {} repository for the topic {}. \
         Answer with plain reStructuredText only: no numbering and no Markdown code fences.",
        filename, repository_name, topic
    );
    Request::new(question).with_search(topic)
}

pub fn conf_py_request(repository_name: &str) -> Request {
    let question = format!(
        "Generate the Sphinx conf.py file for the {} repository, following the style of {}. \
         Answer with the Python source only, without Markdown code fences.",
        repository_name, CONF_PY_EXAMPLE_URL
    );
    Request::new(question).with_search("sphinx conf.py")
}

pub fn index_request(repository_name: &str, file_names: &[String]) -> Request {
    let question = format!(
        "Generate the index.rst file for the {} repository. \
         Its toctree must reference every one of these files:\n{}\n\
         Answer with plain reStructuredText only, without Markdown code fences.",
        repository_name,
        file_names.join("\n")
    );
    Request::new(question).with_search(repository_name)
}

/// Split an endpoint answer into one entry per line.
///
/// Entries are kept verbatim apart from a trailing `\r`, so positions line up
/// with what the endpoint produced.
pub fn split_output(output: &str) -> Vec<String> {
    output
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}
