// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! JSON export of reconstructed topologies and verification reports.

use crate::topology::LabeledTopology;
use crate::verify::VerificationReport;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// The error type for export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize the topology")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write the export file")]
    Io(#[from] std::io::Error),
}

/// Serializes a labeled topology as pretty-printed JSON.
pub fn topology_to_json(topology: &LabeledTopology) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(topology)?)
}

/// Writes a labeled topology as JSON to the given writer.
pub fn write_topology<W: Write>(topology: &LabeledTopology, writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, topology)?;
    Ok(())
}

/// Writes a labeled topology as a JSON file.
pub fn write_topology_file<P: AsRef<Path>>(
    topology: &LabeledTopology,
    path: P,
) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_topology(topology, std::io::BufWriter::new(file))
}

/// Serializes a full verification report as pretty-printed JSON.
pub fn report_to_json(report: &VerificationReport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::TopologyReconstructor;
    use canopy_model::graph::ConnectivityGraph;
    use canopy_model::index::NodeIndex;
    use canopy_model::variable::{Assignment, VarKey};

    fn ni(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    fn labeled_chain() -> LabeledTopology {
        let mut graph = ConnectivityGraph::<i64>::new(2);
        graph.add_link(ni(0), ni(1));
        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 1.0);
        assignment.set(VarKey::Level(ni(1), 1), 1.0);
        assignment.set(VarKey::Parent(ni(0), ni(1)), 1.0);
        TopologyReconstructor::new(&graph).reconstruct_single(&assignment)
    }

    #[test]
    fn test_topology_json_round_trip() {
        let topology = labeled_chain();
        let json = topology_to_json(&topology).unwrap();
        let restored: LabeledTopology = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, topology);
    }

    #[test]
    fn test_json_names_roles_and_labels() {
        let json = topology_to_json(&labeled_chain()).unwrap();
        assert!(json.contains("\"Donor\""));
        assert!(json.contains("\"Relay\""));
        assert!(json.contains("\"On\""));
        assert!(json.contains("\"Off\""));
    }

    #[test]
    fn test_write_to_buffer() {
        let mut buffer = Vec::new();
        write_topology(&labeled_chain(), &mut buffer).unwrap();
        assert!(!buffer.is_empty());
    }
}
