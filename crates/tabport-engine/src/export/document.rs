//! The tagged export document.
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <export columns="id;name">
//!   <row>
//!     <id>1</id>
//!     <name>a</name>
//!   </row>
//! </export>
//! ```

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Serialize;
use tabport_core::element::Row;

use crate::error::EngineError;

/// Rows read for an export, in column request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportDocument {
    pub column_separator: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ExportDocument {
    /// Render the tagged XML form. NULL values become empty elements.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Document`] if the writer fails.
    pub fn to_xml(&self) -> Result<String, EngineError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        write_event(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;

        let columns = self.columns.join(&self.column_separator);
        let mut root = BytesStart::new("export");
        root.push_attribute(("columns", columns.as_str()));
        write_event(&mut writer, Event::Start(root))?;

        for row in &self.rows {
            write_event(&mut writer, Event::Start(BytesStart::new("row")))?;
            for element in row {
                let name = element.column_name.as_str();
                match element.value.as_deref() {
                    Some(text) if !text.is_empty() => {
                        write_event(&mut writer, Event::Start(BytesStart::new(name)))?;
                        write_event(&mut writer, Event::Text(BytesText::new(text)))?;
                        write_event(&mut writer, Event::End(BytesEnd::new(name)))?;
                    }
                    _ => write_event(&mut writer, Event::Empty(BytesStart::new(name)))?,
                }
            }
            write_event(&mut writer, Event::End(BytesEnd::new("row")))?;
        }
        write_event(&mut writer, Event::End(BytesEnd::new("export")))?;

        String::from_utf8(writer.into_inner()).map_err(|e| EngineError::Document(e.to_string()))
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), EngineError> {
    writer
        .write_event(event)
        .map_err(|e| EngineError::Document(e.to_string()))
}
