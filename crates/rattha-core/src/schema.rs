/// Arrow schema definitions for the canonical section sequence.
pub mod canonical {
    use arrow::array::{ArrayRef, Float64Array, StringArray, UInt32Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::error::ArrowError;
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    use crate::record::SectionRecord;

    /// One row per healed record, in canonical order.
    pub fn schema() -> Schema {
        Schema::new(vec![
            Field::new("position", DataType::UInt32, false),
            Field::new("id", DataType::Utf8, false),
            Field::new("kind", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("status", DataType::Utf8, false),
            Field::new("similarity", DataType::Float64, true),
            Field::new("ocr_text", DataType::Utf8, true),
            Field::new("legacy_text", DataType::Utf8, true),
        ])
    }

    /// Build a RecordBatch from healed records.
    pub fn to_record_batch(records: &[SectionRecord]) -> Result<RecordBatch, ArrowError> {
        let position = UInt32Array::from_iter_values((0..records.len()).map(|i| i as u32));
        let id = StringArray::from_iter_values(records.iter().map(|r| r.id.as_str()));
        let kind = StringArray::from_iter_values(records.iter().map(|r| r.kind.as_str()));
        let content = StringArray::from_iter_values(records.iter().map(|r| r.content.as_str()));
        let status = StringArray::from_iter_values(records.iter().map(|r| r.status.as_str()));
        let similarity: Float64Array = records.iter().map(|r| r.similarity).collect();
        let ocr_text: StringArray = records
            .iter()
            .map(|r| r.legacy_reference.as_ref().map(|l| l.ocr.as_str()))
            .collect();
        let legacy_text: StringArray = records
            .iter()
            .map(|r| r.legacy_reference.as_ref().map(|l| l.legacy.as_str()))
            .collect();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(position),
            Arc::new(id),
            Arc::new(kind),
            Arc::new(content),
            Arc::new(status),
            Arc::new(similarity),
            Arc::new(ocr_text),
            Arc::new(legacy_text),
        ];
        RecordBatch::try_new(Arc::new(schema()), columns)
    }
}
