use super::xml::{
    events::{BytesDecl, BytesEnd, BytesStart, Event},
    Element, ToXml, Writer,
};

use std::{
    fmt,
    io::{Cursor, Write},
};

use crate::Error;

pub const ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    headers: Vec<Element>,
    body: Option<Element>,
}

/// A SOAP fault raised by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub code: String,
    pub string: String,
    pub detail: Option<Element>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Body(Option<Element>),
    Fault(Fault),
}

impl Envelope {
    pub fn new(body: Option<Element>) -> Self {
        Self {
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_headers(mut self, headers: Vec<Element>) -> Self {
        self.headers = headers;
        self
    }

    pub fn into_body(self) -> Option<Element> {
        self.body
    }

    pub fn to_request(&self) -> Result<Vec<u8>, quick_xml::Error> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer.write_event(Event::Decl(BytesDecl::new(b"1.0", Some(b"UTF-8".as_ref()), None)))?;
        self.to_xml(&mut writer)?;
        Ok(writer.into_inner().into_inner())
    }
}

impl ToXml for Envelope {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), quick_xml::Error> {
        let envelope = BytesStart::borrowed_name(b"soapenv:Envelope")
            .with_attributes([("xmlns:soapenv", ENVELOPE_NAMESPACE)]);

        writer.write_event(Event::Start(envelope))?;

        if !self.headers.is_empty() {
            writer.write_event(Event::Start(BytesStart::borrowed_name(b"soapenv:Header")))?;
            for header in &self.headers {
                header.to_xml(writer)?;
            }
            writer.write_event(Event::End(BytesEnd::borrowed(b"soapenv:Header")))?;
        }

        writer.write_event(Event::Start(BytesStart::borrowed_name(b"soapenv:Body")))?;
        if let Some(body) = &self.body {
            body.to_xml(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::borrowed(b"soapenv:Body")))?;

        writer.write_event(Event::End(BytesEnd::borrowed(b"soapenv:Envelope")))?;
        Ok(())
    }
}

/// Reads the content of a reply envelope's `Body`.
pub fn read_reply(message: &[u8]) -> Result<ReplyBody, Error> {
    let envelope = Element::parse(message)?;

    if envelope.local_name() != "Envelope" {
        return Err(Error::MalformedReply(format!(
            "expected Envelope, found '{}'",
            envelope.name
        )));
    }

    let body = envelope
        .child("Body")
        .ok_or_else(|| Error::MalformedReply("envelope has no Body".into()))?;

    match body.children.first() {
        Some(fault) if fault.local_name() == "Fault" => {
            let text = |name: &str| {
                fault
                    .child(name)
                    .and_then(|child| child.text.clone())
                    .unwrap_or_default()
            };

            Ok(ReplyBody::Fault(Fault {
                code: text("faultcode"),
                string: text("faultstring"),
                detail: fault.child("detail").cloned(),
            }))
        }
        first => Ok(ReplyBody::Body(first.cloned())),
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}", self.code, self.string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_headers_and_body() {
        let envelope = Envelope::new(Some(
            Element::new("ns0:Ping")
                .with_attribute("xmlns:ns0", "urn:billing")
                .with_child(Element::new("ns0:message").with_text("hi")),
        ))
        .with_headers(vec![Element::new("Auth").with_child(Element::new("user").with_text("ann"))]);

        let request = String::from_utf8(envelope.to_request().unwrap()).unwrap();

        assert_eq!(
            request,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">"#,
                r#"<soapenv:Header><Auth><user>ann</user></Auth></soapenv:Header>"#,
                r#"<soapenv:Body><ns0:Ping xmlns:ns0="urn:billing"><ns0:message>hi</ns0:message></ns0:Ping></soapenv:Body>"#,
                r#"</soapenv:Envelope>"#,
            )
        );
    }

    #[test]
    fn header_is_omitted_when_empty() {
        let request = String::from_utf8(Envelope::new(None).to_request().unwrap()).unwrap();

        assert!(!request.contains("Header"));
        assert!(request.contains("<soapenv:Body></soapenv:Body>"));
    }

    #[test]
    fn reads_reply_body() {
        let reply = read_reply(
            br#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
                  <soap:Body><r:AddResponse xmlns:r="urn:calc"><result>5</result></r:AddResponse></soap:Body>
                </soap:Envelope>"#,
        )
        .unwrap();

        match reply {
            ReplyBody::Body(Some(body)) => {
                assert_eq!(body.local_name(), "AddResponse");
                assert_eq!(body.child("result").unwrap().text.as_deref(), Some("5"));
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn cdata_text_is_kept_verbatim() {
        let reply = read_reply(
            br#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
                  <soap:Body><EchoResponse><text><![CDATA[a & b < c]]></text></EchoResponse></soap:Body>
                </soap:Envelope>"#,
        )
        .unwrap();

        match reply {
            ReplyBody::Body(Some(body)) => {
                assert_eq!(body.child("text").unwrap().text.as_deref(), Some("a & b < c"));
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn reads_fault() {
        let reply = read_reply(
            br#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
                  <soap:Body><soap:Fault>
                    <faultcode>soap:Client</faultcode>
                    <faultstring>Unknown customer</faultstring>
                  </soap:Fault></soap:Body>
                </soap:Envelope>"#,
        )
        .unwrap();

        assert_eq!(
            reply,
            ReplyBody::Fault(Fault {
                code: "soap:Client".into(),
                string: "Unknown customer".into(),
                detail: None,
            })
        );
    }

    #[test]
    fn rejects_non_envelope() {
        assert!(matches!(
            read_reply(b"<html><body/></html>"),
            Err(Error::MalformedReply(_))
        ));
    }
}
