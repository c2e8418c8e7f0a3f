//! Graph JSON file
//!
//! The file maps each expanded account id, as a string, to its ranked
//! neighbor ids: `{"12": ["34", "56"]}`.

use crate::graph::NetworkGraph;
use crate::MutualsError;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Renders the graph as pretty-printed JSON
pub fn format_graph(graph: &NetworkGraph) -> Result<String, MutualsError> {
    Ok(serde_json::to_string_pretty(graph)?)
}

/// Writes the graph JSON file, creating missing parent directories
///
/// # Arguments
///
/// * `graph` - The crawled graph
/// * `path` - Destination file, replaced if it exists
pub fn write_graph(graph: &NetworkGraph, path: &Path) -> Result<(), MutualsError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, graph)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Reads a graph JSON file
pub fn read_graph(path: &Path) -> Result<NetworkGraph, MutualsError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
