use acscwmp::*;
use acssoap::{FaultDetail, SoapBody, SoapFault};
use acsxml::DecodeError;
use chrono::{FixedOffset, TimeZone};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn decode_file(name: &str) -> Envelope {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/testdata")
        .join(name);
    let file = File::open(&path).unwrap();
    decode(BufReader::new(file)).unwrap()
}

fn decode_str(xml: &str) -> Envelope {
    decode(xml.as_bytes()).unwrap()
}

/// Encode sans préfixeur : sortie brute de l'encodeur
fn encode_raw(env: &Envelope) -> String {
    let out = encode(Vec::new(), env, Vec::<(String, String)>::new()).unwrap();
    String::from_utf8(out).unwrap()
}

fn encode_prefixed(env: &Envelope) -> String {
    String::from_utf8(encode(Vec::new(), env, default_prefixes()).unwrap()).unwrap()
}

#[test]
fn test_decode_inform() {
    let env = decode_file("inform.xml");
    assert_eq!(env.header, Some(Header::with_id("a1b2c3")));

    let Body::Inform(inform) = env.into_content().unwrap() else {
        panic!("Body is not an Inform");
    };

    assert_eq!(inform.device_id.manufacturer, "MikroTik");
    assert_eq!(inform.device_id.oui, "E48D8C");
    assert_eq!(inform.device_id.product_class, "hAP mini");
    assert_eq!(inform.device_id.serial_number, "B7B20A1DE3F0");

    assert_eq!(inform.event.len(), 1);
    assert_eq!(inform.event[0].event_code, "2 PERIODIC");
    assert_eq!(inform.event[0].command_key, "");

    assert_eq!(inform.max_envelopes, 1);
    assert_eq!(inform.retry_count, 0);
    let est = FixedOffset::west_opt(5 * 60 * 60).unwrap();
    assert_eq!(
        inform.current_time,
        Some(est.with_ymd_and_hms(2020, 1, 2, 20, 50, 49).unwrap())
    );

    let expected = [
        ("Device.RootDataModelVersion", "2.11"),
        ("Device.DeviceInfo.SoftwareVersion", "6.46.1"),
        ("Device.DeviceInfo.ProvisioningCode", ""),
        ("Device.DeviceInfo.HardwareVersion", "v1.0"),
        ("Device.ManagementServer.ParameterKey", ""),
        (
            "Device.ManagementServer.ConnectionRequestURL",
            "http://10.31.0.130:7547/e55b182787ec5d4c2d4bcaa39d234920bd35",
        ),
        ("Device.ManagementServer.AliasBasedAddressing", "0"),
    ];
    assert_eq!(inform.parameter_list.len(), expected.len());
    for (got, (name, value)) in inform.parameter_list.iter().zip(expected) {
        assert_eq!(got.name, name);
        assert_eq!(got.value, value);
    }
}

#[test]
fn test_decode_fault() {
    let env = decode_file("fault.xml");
    let Body::Fault(fault) = env.into_content().unwrap() else {
        panic!("Body is not a Fault");
    };

    assert_eq!(fault.code, "Client");
    assert_eq!(fault.string, "CWMP fault");
    assert_eq!(fault.factor, "");
    assert_eq!(
        fault.typed_detail(),
        Some(&CwmpFault::new(9000, "Upload method not supported"))
    );
}

#[test]
fn test_decode_fault_with_parameter_faults() {
    let env = decode_file("fault.2.xml");
    let Body::Fault(fault) = env.into_content().unwrap() else {
        panic!("Body is not a Fault");
    };

    let detail = fault.typed_detail().unwrap();
    assert_eq!(detail.code, fault_codes::CPE_INVALID_ARGUMENTS);
    assert_eq!(detail.string, "Invalid arguments");
    assert_eq!(
        detail.set_parameter_values_faults,
        vec![
            SetParameterValuesFault {
                parameter_name: "Device.Time.NTPServer1".to_string(),
                fault_code: 9007,
                fault_string: "Invalid IP Address".to_string(),
            },
            SetParameterValuesFault {
                parameter_name: "Device.Time.LocalTimeZoneName".to_string(),
                fault_code: 9007,
                fault_string: "String too long".to_string(),
            },
        ]
    );

    // Réencodé dans le même ordre
    let xml = encode_prefixed(&Envelope::new(Body::Fault(fault.clone())));
    let first = xml.find("Device.Time.NTPServer1").unwrap();
    let second = xml.find("Device.Time.LocalTimeZoneName").unwrap();
    assert!(first < second);
    assert!(xml.contains("<detail><cwmp:Fault><FaultCode>9003</FaultCode>"));

    let back = decode_str(&xml);
    assert_eq!(back.into_content().unwrap(), Body::Fault(fault));
}

#[test]
fn test_decode_header() {
    let env = decode_str(
        "<soapenv:Envelope>
	<soapenv:Header>
		<cwmp:ID>MyID123Here</cwmp:ID>
		<skip>Skip this header</skip>
		<cwmp:SessionTimeout>2</cwmp:SessionTimeout>
		<cwmp:UseCWMPVersion>1.4</cwmp:UseCWMPVersion>
		<cwmp:HoldRequests>1</cwmp:HoldRequests>
		<cwmp:SupportedCWMPVersions>1.0,1.1,1.4</cwmp:SupportedCWMPVersions>
	</soapenv:Header>
	<soapenv:Body>
	</soapenv:Body>
</soapenv:Envelope>",
    );

    assert_eq!(
        env.header,
        Some(Header {
            id: Some("MyID123Here".to_string()),
            hold_requests: Some(true),
            session_timeout: Some(2),
            supported_cwmp_versions: Some(["1.0", "1.1", "1.4"].into_iter().collect()),
            use_cwmp_version: Some("1.4".to_string()),
        })
    );
    assert_eq!(env.body, SoapBody::Empty);
}

#[test]
fn test_decode_header_empty() {
    let env = decode_str(
        "<soapenv:Envelope>\n\t<soapenv:Header>\n\t</soapenv:Header>\n\t<soapenv:Body>\n\t</soapenv:Body>\n</soapenv:Envelope>",
    );
    assert_eq!(env.header, Some(Header::default()));
}

#[test]
fn test_decode_header_partial() {
    let env = decode_str(
        "<soapenv:Envelope><soapenv:Header><cwmp:SessionTimeout>2</cwmp:SessionTimeout><cwmp:SupportedCWMPVersions>1.0,1.1,1.4</cwmp:SupportedCWMPVersions></soapenv:Header><soapenv:Body></soapenv:Body></soapenv:Envelope>",
    );
    let header = env.header.unwrap();
    assert_eq!(header.session_timeout, Some(2));
    assert_eq!(
        header.supported_cwmp_versions.as_ref().map(|v| v.0.clone()),
        Some(vec!["1.0".to_string(), "1.1".to_string(), "1.4".to_string()])
    );
    assert_eq!(header.id, None);
    assert_eq!(header.hold_requests, None);
    assert_eq!(header.use_cwmp_version, None);
}

#[test]
fn test_hold_requests_false_is_not_absent() {
    let env = decode_str(
        "<Envelope><Header><HoldRequests>false</HoldRequests></Header><Body/></Envelope>",
    );
    assert_eq!(env.header.unwrap().hold_requests, Some(false));
}

#[test]
fn test_encode_header() {
    let header = Header {
        id: Some("1234".to_string()),
        hold_requests: Some(true),
        session_timeout: Some(2),
        supported_cwmp_versions: Some(CwmpVersions::parse("1.0,1.1,1.4")),
        use_cwmp_version: Some("1.4".to_string()),
    };
    let env = Envelope::with_header(header, Body::RebootResponse(RebootResponse::default()));

    assert_eq!(
        encode_prefixed(&env),
        concat!(
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:cwmp="urn:dslforum-org:cwmp-1-0">"#,
            "<soapenv:Header>",
            r#"<cwmp:ID soapenv:mustUnderstand="1">1234</cwmp:ID>"#,
            r#"<cwmp:HoldRequests soapenv:mustUnderstand="1">1</cwmp:HoldRequests>"#,
            "<cwmp:SessionTimeout>2</cwmp:SessionTimeout>",
            "<cwmp:SupportedCWMPVersions>1.0,1.1,1.4</cwmp:SupportedCWMPVersions>",
            r#"<cwmp:UseCWMPVersion soapenv:mustUnderstand="1">1.4</cwmp:UseCWMPVersion>"#,
            "</soapenv:Header>",
            "<soapenv:Body><cwmp:RebootResponse></cwmp:RebootResponse></soapenv:Body>",
            "</soapenv:Envelope>"
        )
    );
}

#[test]
fn test_header_independence() {
    let header = Header {
        session_timeout: Some(30),
        ..Header::default()
    };
    let env = Envelope::with_header(header.clone(), Body::InformResponse(InformResponse::default()));
    let xml = encode_prefixed(&env);

    assert_eq!(xml.matches("<cwmp:").count(), 2);
    assert!(xml.contains("<soapenv:Header><cwmp:SessionTimeout>30</cwmp:SessionTimeout></soapenv:Header>"));

    let back = decode_str(&xml);
    assert_eq!(back.header, Some(header));
}

#[test]
fn test_no_header_no_header_element() {
    let env = Envelope::new(Body::InformResponse(InformResponse::default()));
    let xml = encode_raw(&env);
    assert_eq!(
        xml,
        r#"<Envelope xmlns="http://schemas.xmlsoap.org/soap/envelope/"><Body xmlns="http://schemas.xmlsoap.org/soap/envelope/"><InformResponse xmlns="urn:dslforum-org:cwmp-1-0"><MaxEnvelopes>1</MaxEnvelopes></InformResponse></Body></Envelope>"#
    );
}

#[test]
fn test_encode_inform_response_prefixed() {
    let env = Envelope::with_header(
        Header::with_id("1234"),
        Body::InformResponse(InformResponse { max_envelopes: 99 }),
    );
    assert_eq!(
        encode_prefixed(&env),
        r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:cwmp="urn:dslforum-org:cwmp-1-0"><soapenv:Header><cwmp:ID soapenv:mustUnderstand="1">1234</cwmp:ID></soapenv:Header><soapenv:Body><cwmp:InformResponse><MaxEnvelopes>1</MaxEnvelopes></cwmp:InformResponse></soapenv:Body></soapenv:Envelope>"#
    );
}

#[test]
fn test_encode_get_rpc_methods_response() {
    let env = Envelope::new(Body::GetRPCMethodsResponse(GetRPCMethodsResponse {
        method_list: vec!["Method1".to_string(), "Method2".to_string()],
    }));
    assert!(encode_prefixed(&env).contains(
        "<cwmp:GetRPCMethodsResponse><MethodList><string>Method1</string><string>Method2</string></MethodList></cwmp:GetRPCMethodsResponse>"
    ));
}

#[test]
fn test_unrecognized_body() {
    let env = decode_str(r#"<Envelope xmlns="http://schemas.xmlsoap.org/soap/envelope/"><Body><FooBar/></Body></Envelope>"#);
    assert_eq!(env.body, SoapBody::Unrecognized("FooBar".to_string()));

    match env.into_content() {
        Err(DecodeError::UnrecognizedMessage(name)) => {
            assert_eq!(name, "FooBar");
            let Body::Fault(fault) = Body::method_not_supported(&name) else {
                panic!("expected a fault");
            };
            assert_eq!(
                fault.typed_detail().map(|d| d.code),
                Some(fault_codes::METHOD_NOT_SUPPORTED)
            );
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_protocol_errors() {
    for (xml, expected) in [
        ("<Message><Body/></Message>", "expected Envelope"),
        ("<Envelope><Header/><Inform/></Envelope>", "expected Body"),
    ] {
        match decode(xml.as_bytes()) {
            Err(DecodeError::Protocol(msg)) => assert_eq!(msg, expected),
            other => panic!("unexpected result for {}: {:?}", xml, other),
        }
    }
}

#[test]
fn test_malformed_xml() {
    let err = decode("<Envelope><Body><Inform>".as_bytes()).unwrap_err();
    assert!(!err.is_recoverable());
    assert!(matches!(err, DecodeError::Malformed(_) | DecodeError::Xml(_)));
}

#[test]
fn test_decode_payload_empty() {
    assert!(decode_payload(b"").unwrap().is_none());
    assert!(decode_payload(b" \r\n").unwrap().is_none());
    assert!(decode_payload(b"<Envelope><Body/></Envelope>").unwrap().is_some());
}

#[test]
fn test_detail_opaque_fallback() {
    let env = decode_str(
        r#"<Envelope><Body><Fault><faultcode>Server</faultcode><faultstring>x</faultstring><faultfactor>f</faultfactor><detail><VendorError><Code>1</Code></VendorError></detail></Fault></Body></Envelope>"#,
    );
    let Body::Fault(fault) = env.into_content().unwrap() else {
        panic!("Body is not a Fault");
    };
    assert_eq!(fault.factor, "f");
    match &fault.detail {
        Some(FaultDetail::Opaque(elements)) => assert_eq!(elements[0].name, "VendorError"),
        other => panic!("unexpected detail: {:?}", other),
    }
}

#[test]
fn test_round_trip_bodies() {
    let est = FixedOffset::west_opt(5 * 60 * 60).unwrap();
    let time = Some(est.with_ymd_and_hms(2020, 1, 2, 20, 50, 49).unwrap());

    let bodies = vec![
        Body::Inform(Inform {
            device_id: DeviceIdStruct {
                manufacturer: "MikroTik".to_string(),
                oui: "E48D8C".to_string(),
                product_class: "hAP mini".to_string(),
                serial_number: "B7B20A1DE3F0".to_string(),
            },
            event: vec![
                EventStruct {
                    event_code: "1 BOOT".to_string(),
                    command_key: String::new(),
                },
                EventStruct {
                    event_code: "M Reboot".to_string(),
                    command_key: "reboot-1".to_string(),
                },
            ],
            max_envelopes: 1,
            current_time: time,
            retry_count: 2,
            parameter_list: vec![ParameterValueStruct::new("Device.A", "1 < 2 & 3")],
        }),
        Body::Inform(Inform::default()),
        Body::InformResponse(InformResponse::default()),
        Body::GetRPCMethods(GetRPCMethods::default()),
        Body::GetRPCMethodsResponse(GetRPCMethodsResponse::default()),
        Body::Reboot(Reboot {
            command_key: "k".to_string(),
        }),
        Body::RebootResponse(RebootResponse::default()),
        Body::TransferComplete(TransferComplete {
            command_key: "fw".to_string(),
            fault_struct: FaultStruct {
                fault_code: 9010,
                fault_string: "Download failed".to_string(),
            },
            start_time: time,
            complete_time: None,
        }),
        Body::TransferCompleteResponse(TransferCompleteResponse::default()),
        Body::AutonomousTransferComplete(AutonomousTransferComplete {
            announce_url: "http://acs/announce".to_string(),
            transfer_url: "http://files/fw.bin".to_string(),
            is_download: true,
            file_type: "1 Firmware Upgrade Image".to_string(),
            file_size: 1024,
            target_file_name: "fw.bin".to_string(),
            fault_struct: FaultStruct::default(),
            start_time: time,
            complete_time: time,
        }),
        Body::AutonomousTransferCompleteResponse(AutonomousTransferCompleteResponse::default()),
        Body::Download(Download {
            command_key: "dl".to_string(),
            file_type: "1 Firmware Upgrade Image".to_string(),
            url: "http://files/fw.bin".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            file_size: 2048,
            target_file_name: "fw.bin".to_string(),
            delay_seconds: 10,
            success_url: String::new(),
            failure_url: String::new(),
        }),
        Body::DownloadResponse(DownloadResponse {
            status: 1,
            start_time: None,
            complete_time: None,
        }),
        Body::GetParameterNames(GetParameterNames {
            parameter_path: "Device.".to_string(),
            next_level: true,
        }),
        Body::GetParameterNamesResponse(GetParameterNamesResponse {
            parameter_list: vec![
                ParameterInfoStruct {
                    name: "Device.DeviceInfo.".to_string(),
                    writable: false,
                },
                ParameterInfoStruct {
                    name: "Device.Time.NTPServer1".to_string(),
                    writable: true,
                },
            ],
        }),
        Body::GetParameterValues(GetParameterValues {
            parameter_names: vec!["Device.DeviceInfo.".to_string()],
        }),
        Body::GetParameterValuesResponse(GetParameterValuesResponse {
            parameter_list: vec![ParameterValueStruct::new("Device.DeviceInfo.UpTime", "42")],
        }),
        Body::SetParameterValues(SetParameterValues {
            parameter_list: vec![ParameterValueStruct::new("Device.Time.NTPServer1", "pool.ntp.org")],
            parameter_key: "v2".to_string(),
        }),
        Body::SetParameterValuesResponse(SetParameterValuesResponse { status: 0 }),
        Body::fault(fault_codes::INVALID_ARGUMENTS, "Invalid arguments"),
    ];

    for body in bodies {
        let env = Envelope::with_header(Header::with_id("rt"), body.clone());
        let xml = encode_prefixed(&env);
        let back = decode_str(&xml);
        assert_eq!(back.header, Some(Header::with_id("rt")), "{}", xml);
        assert_eq!(back.into_content().unwrap(), body, "{}", xml);
    }
}

#[test]
fn test_fault_without_detail_decodes_empty() {
    let fault: SoapFault<CwmpFault> = SoapFault::new("Server", "no detail");
    let xml = encode_raw(&Envelope::new(Body::Fault(fault)));
    let Body::Fault(back) = decode_str(&xml).into_content().unwrap() else {
        panic!("Body is not a Fault");
    };
    assert_eq!(back.detail, Some(FaultDetail::Empty));
}
