//! Serde roundtrip tests for the types that cross crate and process boundaries.

use pretty_assertions::assert_eq;
use tabport_core::column::{ColumnDescriptor, ColumnType};
use tabport_core::element::RowElement;
use tabport_core::entities::AutomaticExportConfig;
use tabport_core::enums::Severity;
use tabport_core::result::{ImportMessage, ImportResult};

macro_rules! roundtrip {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;
            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );
        }
    };
}

roundtrip!(
    import_result_roundtrip,
    ImportResult,
    ImportResult::new(
        5,
        1,
        2,
        vec![
            ImportMessage::error("Invalid int value 'x' for column 'qty'", 6),
            ImportMessage {
                text: "duplicate row".into(),
                severity: Severity::Skipped,
                item_number: 7,
            },
        ],
    )
);

roundtrip!(
    export_config_roundtrip,
    AutomaticExportConfig,
    AutomaticExportConfig {
        id: 3,
        table_name: "customers".into(),
        output_file_name: "customers.xml".into(),
        columns: vec!["id".into(), "name".into()],
        transform_id: "none".into(),
        data_source: "default".into(),
    }
);

roundtrip!(
    descriptor_roundtrip,
    ColumnDescriptor,
    ColumnDescriptor::from_catalog("ID", "BIGINT", true)
);

roundtrip!(
    unknown_descriptor_roundtrip,
    ColumnDescriptor,
    ColumnDescriptor::from_catalog("ratio", "DECIMAL(4,2)", false)
);

roundtrip!(
    element_roundtrip,
    RowElement,
    RowElement::new("payload", None)
);

#[test]
fn descriptor_json_uses_snake_case_type() {
    let json = serde_json::to_value(ColumnDescriptor::from_catalog("ts", "TIMESTAMP", false)).unwrap();
    assert_eq!(json["column_type"], "timestamp");
    assert_eq!(json["data_type"], "TIMESTAMP");
    assert_eq!(json["nullable"], true);
    assert_eq!(
        ColumnType::classify(json["data_type"].as_str()),
        Some(ColumnType::Timestamp)
    );
}
