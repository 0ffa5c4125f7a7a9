//! # jar-identifier
//!
//! Identifies the Maven coordinates (groupId, artifactId, version) of jars
//! with unknown provenance so they can be deposited into a repository under
//! correct coordinates.
//!
//! ## Architecture
//!
//! - **scan**: Expansion of `--jars` arguments into jar file paths
//! - **jar**: Single-pass jar reading and the compression-independent hash
//! - **manifest**, **jarname**, **pom**, **classpath**, **timestamp**,
//!   **post**: The offline analyzers, each inspecting one facet of a jar
//! - **candidate**: Candidate accumulation, deduplication and ranking
//! - **select**: Which candidate combinations to probe online
//! - **settings**: Remote repository discovery from the host's Maven setup
//! - **repo**: Online resolution against remote repositories and match
//!   classification
//! - **pipeline**: Offline phase, concurrent online checks, consolidation
//! - **printer** / **prompt**: Console output and interactive UID completion
//! - **report**: The structured JSON result document

pub mod candidate;
pub mod classpath;
pub mod cli;
pub mod jar;
pub mod jarname;
pub mod manifest;
pub mod pipeline;
pub mod pom;
pub mod post;
pub mod printer;
pub mod prompt;
pub mod repo;
pub mod report;
pub mod scan;
pub mod select;
pub mod settings;
pub mod timestamp;
pub mod uid;
