use std::{
    fmt,
    io::{Cursor, Write},
};

pub use quick_xml::{events, Reader, Writer};

use events::{BytesEnd, BytesStart, BytesText, Event};

pub trait ToXml {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), quick_xml::Error>;
}

/// A loosely typed XML element: the object graph of a reply, or a
/// hand-built SOAP header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Name as written, including any prefix.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, name)| name)
    }

    /// First child with the given local name.
    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|child| child.local_name() == local_name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Reads the root element of `xml`.
    pub fn parse(xml: &[u8]) -> Result<Self, quick_xml::Error> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut buffer = Vec::new();

        loop {
            match reader.read_event(&mut buffer)? {
                Event::Start(start) => stack.push(Self::from_start(&reader, &start)?),

                Event::Empty(start) => {
                    let element = Self::from_start(&reader, &start)?;
                    if let Some(root) = attach(&mut stack, element) {
                        return Ok(root);
                    }
                }

                Event::End(..) => {
                    if let Some(element) = stack.pop() {
                        if let Some(root) = attach(&mut stack, element) {
                            return Ok(root);
                        }
                    }
                }

                Event::Text(text) => {
                    if let Some(element) = stack.last_mut() {
                        element
                            .text
                            .get_or_insert_with(String::new)
                            .push_str(&text.unescape_and_decode(&reader)?);
                    }
                }

                Event::CData(text) => {
                    if let Some(element) = stack.last_mut() {
                        element
                            .text
                            .get_or_insert_with(String::new)
                            .push_str(&text.unescape_and_decode(&reader)?);
                    }
                }

                Event::Eof => {
                    return Err(quick_xml::Error::UnexpectedEof(
                        "document has no root element".into(),
                    ))
                }

                _ => (),
            }

            buffer.clear();
        }
    }

    fn from_start<B: std::io::BufRead>(
        reader: &Reader<B>,
        start: &BytesStart<'_>,
    ) -> Result<Self, quick_xml::Error> {
        let mut element = Self::new(reader.decode(start.name())?);

        for attribute in start.attributes() {
            let attribute = attribute?;
            element.attributes.push((
                reader.decode(attribute.key)?.to_owned(),
                attribute.unescape_and_decode_value(reader)?,
            ));
        }

        Ok(element)
    }

    pub fn to_xml_string(&self) -> Result<String, quick_xml::Error> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.to_xml(&mut writer)?;
        Ok(String::from_utf8_lossy(&writer.into_inner().into_inner()).into_owned())
    }
}

fn attach(stack: &mut Vec<Element>, element: Element) -> Option<Element> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            None
        }
        None => Some(element),
    }
}

impl ToXml for Element {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), quick_xml::Error> {
        let start = BytesStart::borrowed_name(self.name.as_bytes()).with_attributes(
            self.attributes
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
        );

        if self.text.is_none() && self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;

        if let Some(text) = &self.text {
            writer.write_event(Event::Text(BytesText::from_plain_str(text)))?;
        }

        for child in &self.children {
            child.to_xml(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::borrowed(self.name.as_bytes())))?;
        Ok(())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = self.to_xml_string().map_err(|_| fmt::Error)?;
        f.write_str(&xml)
    }
}
