//! docgen: generate Sphinx documentation for a repository by asking a hosted
//! text-generation endpoint for topics, file names and page contents.
//!
//! # Architecture
//!
//! - **llm**: endpoint client and its HTTP transport
//! - **prompts**: request construction for every pipeline step
//! - **writer**: persists generated text
//! - **orchestrator**: runs the pipeline and reports what was written
//! - **config**: command line and config file resolution

pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod writer;

pub use config::{Cli, Settings};
pub use error::{DocgenError, Result};
pub use llm::{EndpointClient, ReqwestTransport, Request, Response, Transport};
pub use orchestrator::{Orchestrator, RunConfig, RunReport};
