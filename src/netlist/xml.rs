//! XML front end: turns netlist markup into [`DocumentEvent`]s.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::loader::{DocumentEvent, NetlistLoader};
use super::model::Netlist;
use crate::error::Result;

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn start_events(start: &BytesStart<'_>, loader: &mut NetlistLoader) -> Result<()> {
    loader.handle(DocumentEvent::StartElement(element_name(start)));
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        loader.handle(DocumentEvent::Attribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value: attr.unescape_value()?.into_owned(),
        });
    }
    Ok(())
}

/// Stream markup from `source` into a loader.
pub fn read_into<R: BufRead>(source: R, loader: &mut NetlistLoader) -> Result<()> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(false);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => start_events(&start, loader)?,
            Event::Empty(start) => {
                start_events(&start, loader)?;
                loader.handle(DocumentEvent::EndElement(element_name(&start)));
            }
            Event::Text(text) => loader.handle(DocumentEvent::Text(text.unescape()?.into_owned())),
            Event::CData(data) => {
                loader.handle(DocumentEvent::Text(String::from_utf8_lossy(&data.into_inner()).into_owned()))
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                loader.handle(DocumentEvent::EndElement(name));
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// Parse a netlist document held in memory.
pub fn parse_str(input: &str) -> Result<Netlist> {
    let mut loader = NetlistLoader::new();
    read_into(input.as_bytes(), &mut loader)?;
    Ok(loader.finish())
}
