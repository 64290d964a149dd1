//! Storage codec: turns opaque pipe payloads back into operation views.
//!
//! This is the storage layer's side of the protocol's [`StorageCodec`]
//! capability. Affected paths are the device path extended by each
//! measurement, reported in measurement insertion order.

use crate::error::ModelError;
use crate::insert::InsertRowNode;
use crate::path::Path;
use crate::schema::SchemaPlanNode;
use crate::tablet::Tablet;
use tspipe_protocol::{OperationKind, StorageCodec};

/// A decoded operation payload.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationView {
    InsertRow(InsertRowNode),
    SchemaPlan(SchemaPlanNode),
    Tablet { tablet: Tablet, is_aligned: bool },
}

/// The pipe payload codec for this storage model.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipeCodec;

impl StorageCodec for PipeCodec {
    type View = OperationView;
    type Path = Path;
    type Error = ModelError;

    fn decode_payload(
        &self,
        kind: OperationKind,
        payload: &[u8],
    ) -> Result<OperationView, ModelError> {
        match kind {
            OperationKind::InsertNode => {
                Ok(OperationView::InsertRow(InsertRowNode::decode(payload)?))
            }
            OperationKind::SchemaPlan => {
                Ok(OperationView::SchemaPlan(SchemaPlanNode::decode(payload)?))
            }
            OperationKind::TabletRaw => {
                let (mut tablet, is_aligned) = Tablet::from_pipe_bytes(payload)?;
                // Statement construction assumes timestamp-ordered rows.
                tablet.sort_by_timestamp();
                Ok(OperationView::Tablet { tablet, is_aligned })
            }
        }
    }

    fn affected_paths(&self, view: &OperationView) -> Vec<Path> {
        match view {
            OperationView::InsertRow(node) => node
                .measurements
                .iter()
                .map(|m| node.device.child(m.clone()))
                .collect(),
            OperationView::SchemaPlan(plan) => plan
                .measurements
                .iter()
                .map(|m| plan.device.child(m.clone()))
                .collect(),
            OperationView::Tablet { tablet, .. } => tablet
                .columns()
                .iter()
                .map(|c| tablet.device.child(c.name.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tablet::ColumnSchema;
    use crate::types::{DataType, Value};
    use bytes::Bytes;
    use tspipe_protocol::{TabletBatchReq, TabletInsertNodeReq, TabletRawReq};

    fn sample_insert_node() -> InsertRowNode {
        InsertRowNode {
            device: Path::parse("root.sg.d"),
            is_aligned: false,
            measurements: vec!["s".to_string()],
            data_types: vec![DataType::Int32],
            timestamp: 1,
            values: vec![Value::Int32(1)],
        }
    }

    fn sample_tablet() -> Tablet {
        let mut tablet = Tablet::new(
            Path::parse("root.sg.d"),
            vec![
                ColumnSchema::new("s1", DataType::Int32),
                ColumnSchema::new("s2", DataType::Int64),
                ColumnSchema::new("s3", DataType::Float),
                ColumnSchema::new("s4", DataType::Double),
                ColumnSchema::new("s5", DataType::Boolean),
                ColumnSchema::new("s6", DataType::Text),
            ],
        );
        let row = |s1: i32, s6: &str| {
            vec![
                Some(Value::Int32(s1)),
                None,
                None,
                None,
                None,
                Some(Value::Text(s6.to_string())),
            ]
        };
        tablet.push_row(2000, row(2, "2")).unwrap();
        tablet.push_row(1000, row(1, "1")).unwrap();
        tablet
    }

    #[test]
    fn test_insert_node_statement_paths() {
        let node = sample_insert_node();
        let req = TabletInsertNodeReq::new(node.encode());

        let statement = req.construct_statement(&PipeCodec).unwrap();
        assert_eq!(statement.paths, vec![Path::parse("root.sg.d.s")]);
        match statement.operation {
            OperationView::InsertRow(decoded) => assert_eq!(decoded, node),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_schema_plan_statement_paths() {
        let plan = SchemaPlanNode {
            device: Path::parse("root.sg.d"),
            is_aligned: true,
            measurements: vec!["s".to_string()],
            data_types: vec![DataType::Int32],
        };
        let req = tspipe_protocol::SchemaPlanReq::new(plan.encode());

        let statement = req.construct_statement(&PipeCodec).unwrap();
        assert_eq!(statement.paths, vec![Path::parse("root.sg.d.s")]);
    }

    #[test]
    fn test_tablet_statement_sorts_rows_and_orders_paths() {
        // Rows arrive with timestamps 2000 then 1000; the statement's rows
        // are sorted ascending, and the affected paths follow measurement
        // insertion order s1..s6 regardless of row order.
        let req = TabletRawReq::new(sample_tablet().to_pipe_bytes(false));

        let statement = req.construct_statement(&PipeCodec).unwrap();
        let expected: Vec<Path> = ["s1", "s2", "s3", "s4", "s5", "s6"]
            .iter()
            .map(|m| Path::parse("root.sg.d").child(*m))
            .collect();
        assert_eq!(statement.paths, expected);

        match statement.operation {
            OperationView::Tablet { tablet, is_aligned } => {
                assert!(!is_aligned);
                assert_eq!(tablet.timestamps(), [1000, 2000]);
                assert_eq!(tablet.value("s1", 0), Some(&Value::Int32(1)));
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_batch_with_empty_binary_sequence() {
        let node = sample_insert_node();
        let tablet = sample_tablet();

        let req = TabletBatchReq::new(
            vec![],
            vec![node.encode()],
            vec![tablet.to_pipe_bytes(false)],
        );
        let decoded = TabletBatchReq::from_envelope(&req.to_envelope()).unwrap();

        assert!(decoded.binary_reqs.is_empty());
        assert_eq!(decoded.insert_node_reqs.len(), 1);
        assert_eq!(decoded.insert_node_reqs[0].payload, node.encode());
        assert_eq!(decoded.tablet_reqs.len(), 1);

        let statement = decoded.tablet_reqs[0]
            .construct_statement(&PipeCodec)
            .unwrap();
        match statement.operation {
            OperationView::Tablet { is_aligned, .. } => assert!(!is_aligned),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_batch_of_mixed_operations() {
        let node = sample_insert_node();
        let tablet = sample_tablet();

        let req = TabletBatchReq::new(
            vec![Bytes::from_static(b"ab")],
            vec![node.encode()],
            vec![tablet.to_pipe_bytes(false)],
        );
        let decoded = TabletBatchReq::from_envelope(&req.to_envelope()).unwrap();

        assert_eq!(decoded.binary_reqs[0].payload.as_ref(), b"ab");

        let insert_statement = decoded.insert_node_reqs[0]
            .construct_statement(&PipeCodec)
            .unwrap();
        match insert_statement.operation {
            OperationView::InsertRow(decoded_node) => assert_eq!(decoded_node, node),
            other => panic!("unexpected view: {other:?}"),
        }

        let tablet_statement = decoded.tablet_reqs[0]
            .construct_statement(&PipeCodec)
            .unwrap();
        match tablet_statement.operation {
            OperationView::Tablet { is_aligned, .. } => assert!(!is_aligned),
            other => panic!("unexpected view: {other:?}"),
        }
    }
}
