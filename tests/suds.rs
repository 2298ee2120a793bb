use mockito::Matcher;
use std::time::Duration;
use sudslib::{
    wsdl::SchemaLocations, KeywordError, LibraryOptions, ServiceProxy, SudsBackend, SudsLibrary,
    Value,
};

const INVOICE_REPLY: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body><SendInvoiceResponse xmlns="urn:billing"><invoiceId>INV-7</invoiceId></SendInvoiceResponse></soap:Body>
</soap:Envelope>"#;

const FAULT_REPLY: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body><soap:Fault><faultcode>soap:Client</faultcode><faultstring>Unknown customer</faultstring></soap:Fault></soap:Body>
</soap:Envelope>"#;

fn data(name: &str) -> String {
    format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn library() -> SudsLibrary {
    SudsLibrary::with_backend(
        SudsBackend,
        LibraryOptions {
            timeout: Some(Duration::from_secs(5)),
            schema_locations: SchemaLocations::new(),
        },
    )
}

fn billing(server: &mockito::ServerGuard) -> SudsLibrary {
    let mut library = library();
    library
        .create_client(&data("billing.wsdl"), Some("billing"), "False")
        .unwrap();
    library
        .set_location(&format!("{}/billing", server.url()), "-1", &[] as &[&str])
        .unwrap();
    library
}

#[test]
fn creates_client_from_file_path() {
    let mut library = library();
    let index = library
        .create_client(&data("billing.wsdl"), None, "False")
        .unwrap();

    assert_eq!(index, 1);
    let client = library.client().unwrap();
    assert!(client.wsdl_url().ends_with("/tests/data/billing.wsdl"));
    assert_eq!(client.options().timeout, Some(Duration::from_secs(5)));

    let description = client.to_string();
    assert!(description.contains("Service ( Billing )"), "{}", description);
    assert!(description.contains("SendInvoice(customer, amount)"), "{}", description);
}

#[test]
fn missing_schema_fails_without_doctor() {
    let mut library = library();

    assert!(matches!(
        library.create_client(&data("orders.wsdl"), None, "False"),
        Err(KeywordError::Client(_))
    ));
    assert_eq!(library.client_count(), 0);
}

#[test]
fn doctor_import_supplies_missing_schema() {
    let mut library = library();
    library.add_doctor_import("urn:common", Some("common.xsd"), &["urn:orders"]);

    library
        .create_client(&data("orders.wsdl"), None, "False")
        .unwrap();

    assert!(library.client().unwrap().to_string().contains("PlaceOrder(item, shipTo)"));
}

#[test]
fn bound_schema_location_serves_imports_without_location() {
    let mut library = library();
    let common = sudslib::resolve_source(&data("common.xsd")).unwrap();
    library.bind_schema_to_location("urn:common", &common);
    library.add_doctor_import("urn:common", None, &[] as &[&str]);

    library
        .create_client(&data("orders.wsdl"), None, "True")
        .unwrap();
}

#[test]
fn call_posts_to_overridden_location() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/billing")
        .match_header("soapaction", "\"urn:billing/SendInvoice\"")
        .match_header("x-trace", "abc")
        .match_body(Matcher::Regex(
            "<ns0:customer>ACME</ns0:customer><ns0:amount>12</ns0:amount>".into(),
        ))
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(INVOICE_REPLY)
        .create();

    let mut library = billing(&server);
    library
        .run_keyword("Set Headers", &["X-Trace".into(), "abc".into()])
        .unwrap();

    let reply = library
        .run_keyword(
            "call soap method",
            &["SendInvoice".into(), "ACME".into(), "12".into()],
        )
        .unwrap();

    mock.assert();
    match reply {
        Some(Value::Xml(body)) => {
            assert_eq!(body.local_name(), "SendInvoiceResponse");
            assert_eq!(body.child("invoiceId").unwrap().text.as_deref(), Some("INV-7"));
        }
        other => panic!("unexpected reply {:?}", other),
    }

    assert!(library.get_last_sent().unwrap().contains("SendInvoice"));
    assert!(library.get_last_received().unwrap().contains("INV-7"));
}

#[test]
fn return_xml_gives_raw_reply() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/billing")
        .with_status(200)
        .with_body(INVOICE_REPLY)
        .create();

    let mut library = billing(&server);
    library.set_return_xml("True").unwrap();

    assert_eq!(
        library
            .call_soap_method("SendInvoice", &["ACME", "12"])
            .unwrap(),
        Some(Value::from(INVOICE_REPLY))
    );
}

#[test]
fn server_fault_fails_call_unless_expected() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/billing")
        .with_status(500)
        .with_body(FAULT_REPLY)
        .expect(2)
        .create();

    let mut library = billing(&server);

    assert!(matches!(
        library.call_soap_method("SendInvoice", &["nobody", "1"]),
        Err(KeywordError::Client(sudslib::soap::Error::Fault(_)))
    ));
    assert_eq!(
        library
            .call_soap_method_expecting_fault("SendInvoice", &["nobody", "1"])
            .unwrap(),
        Value::from("Unknown customer")
    );
}

#[test]
fn basic_credentials_are_sent_up_front() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/billing")
        .match_header("authorization", "Basic YW5uOnNlY3JldA==")
        .with_status(200)
        .with_body(INVOICE_REPLY)
        .create();

    let mut library = billing(&server);
    library
        .set_http_authentication("ann", "secret", "always_send")
        .unwrap();
    library
        .call_soap_method("SendInvoice", &["ACME", "12"])
        .unwrap();

    mock.assert();
}

#[test]
fn specific_call_reaches_one_of_several_services() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/america")
        .with_status(200)
        .with_body(INVOICE_REPLY)
        .create();

    let mut library = library();
    library
        .create_client(&data("multi.wsdl"), None, "False")
        .unwrap();
    library
        .set_location(&format!("{}/america", server.url()), "1", &["Track"])
        .unwrap();

    let services = &library.client().unwrap().wsdl().services;
    let location = |service: usize, method: &str| {
        services[service].ports[0]
            .method(method)
            .and_then(|method| method.location.clone())
    };
    assert_eq!(location(1, "Track"), Some(format!("{}/america", server.url())));
    assert_eq!(location(1, "Cancel").as_deref(), Some("http://us.example.com/tracking"));
    assert_eq!(location(0, "Track").as_deref(), Some("http://eu.example.com/tracking"));

    library
        .specific_soap_call(Some("America"), None, "Track", &["PKG-1"])
        .unwrap();

    mock.assert();
    assert_eq!(
        library.client().unwrap().options().service,
        Some(sudslib::soap::Selector::Index(0))
    );
}
