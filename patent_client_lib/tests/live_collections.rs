use std::path::Path;

use chrono::NaiveDate;
use patent_client_lib::{FieldValue, PatentClient, PatentClientError, Settings};
use serde_json::json;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn settings(uri: &str, cache: &Path, with_credentials: bool) -> Settings {
    let mut settings = Settings::default().with_cache_dir(cache);
    settings.ptab.base_url = uri.to_string();
    settings.itc_edis.base_url = uri.to_string();
    if with_credentials {
        settings.itc_edis.username = Some("tester".to_string());
        settings.itc_edis.password = Some("pw".to_string());
    }
    settings
}

fn ptab_documents(uri: &str) -> serde_json::Value {
    json!({
        "metadata": {"count": 1},
        "results": [{
            "id": 170000,
            "trialNumber": "IPR2016-00831",
            "title": "Institution Decision",
            "mediaType": "application/pdf",
            "filingDatetime": "2016-10-17T00:00:00",
            "links": [
                {"rel": "self", "href": format!("{}/documents/170000", uri)},
                {"rel": "download", "href": format!("{}/documents/170000/download", uri)}
            ]
        }]
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn ptab_trial_documents_and_download() {
    let server = MockServer::start().await;
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/trials"))
        .and(query_param("trialNumber", "IPR2016-00831"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("ptab_trial.json")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents"))
        .and(query_param("trialNumber", "IPR2016-00831"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ptab_documents(&uri)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents/170000/download"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let cache = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let cache_dir = cache.path().to_path_buf();
    let out_dir = out.path().to_path_buf();

    tokio::task::spawn_blocking(move || {
        let client = PatentClient::new(settings(&uri, &cache_dir, false)).unwrap();
        let trial = client
            .objects("PtabTrial")
            .unwrap()
            .get_pk("IPR2016-00831")
            .unwrap();
        assert_eq!(trial.to_string(), "<PtabTrial(trial_number=IPR2016-00831)>");
        assert_eq!(
            trial.get("filing_date"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2016, 4, 13).unwrap()))
        );

        let documents = trial.many("documents").unwrap();
        assert_eq!(documents.count().unwrap(), 1);
        let document = documents.first().unwrap();
        assert_eq!(document.to_string(), "<PtabDocument(title=Institution Decision)>");
        assert_eq!(
            document.one("trial").unwrap().str_field("trial_number").unwrap(),
            "IPR2016-00831"
        );

        let first = client.download(&document, &out_dir.join("a")).unwrap();
        let second = client.download(&document, &out_dir.join("b")).unwrap();
        assert_eq!(first.file_name().unwrap(), "Institution Decision.pdf");
        assert_eq!(std::fs::read(&second).unwrap(), b"%PDF-1.4");
        assert!(cache_dir
            .join("ptab")
            .join("IPR2016-00831")
            .join("Institution Decision.pdf")
            .exists());

        // a second client on the same directory is served from disk
        let again = PatentClient::new(settings(&uri, &cache_dir, false)).unwrap();
        let cached = again
            .objects("PtabTrial")
            .unwrap()
            .filter_pk("IPR2016-00831")
            .unwrap();
        assert_eq!(cached.count().unwrap(), 1);
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn ptab_http_errors_surface_as_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trials"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let cache = tempfile::tempdir().unwrap();
    let cache_dir = cache.path().to_path_buf();
    let result = tokio::task::spawn_blocking(move || {
        let client = PatentClient::new(settings(&uri, &cache_dir, false))?;
        client.objects("PtabTrial")?.count()
    })
    .await
    .unwrap();

    assert!(matches!(
        result,
        Err(PatentClientError::Api(patent_client_api::Error::HttpStatus { status: 500, .. }))
    ));
    // failures are not memoized
    assert_eq!(std::fs::read_dir(cache.path().join("ptab")).unwrap().count(), 0);
}

fn attachments_xml(uri: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<results>
  <attachments>
    <attachment>
      <id>1100001</id>
      <documentId>580000</documentId>
      <title>Complaint</title>
      <fileSize>1048576</fileSize>
      <originalFileName>complaint.pdf</originalFileName>
      <pageCount>42</pageCount>
      <createDate>2016/05/02 10:00:00</createDate>
      <lastModifiedDate>2016/05/02 10:05:00</lastModifiedDate>
      <downloadUri>{}/download/580000/1100001</downloadUri>
    </attachment>
  </attachments>
</results>"#,
        uri
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn edis_investigation_to_attachment_download() {
    let server = MockServer::start().await;
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/secretKey/tester"))
        .and(query_param("password", "pw"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(load_fixture("edis_secret_key.xml")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/investigation/337-TA-1000"))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(load_fixture("edis_investigation.xml")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/document"))
        .and(query_param("investigationNumber", "337-TA-1000"))
        .and(query_param("pagenumber", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(load_fixture("edis_documents.xml")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/document/580000"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(load_fixture("edis_documents.xml")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/attachment/580000"))
        .respond_with(ResponseTemplate::new(200).set_body_string(attachments_xml(&uri)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/580000/1100001"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"complaint".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let cache = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let cache_dir = cache.path().to_path_buf();
    let out_dir = out.path().to_path_buf();

    tokio::task::spawn_blocking(move || {
        let client = PatentClient::new(settings(&uri, &cache_dir, true)).unwrap();
        let investigation = client
            .objects("itc_edis.ItcInvestigation")
            .unwrap()
            .get_pk("337-TA-1000")
            .unwrap();
        assert_eq!(investigation.to_string(), "<ItcInvestigation(number=337-TA-1000)>");
        assert_eq!(investigation.str_field("status").unwrap(), "Active");

        let documents = investigation.many("documents").unwrap();
        assert_eq!(documents.count().unwrap(), 2);
        let complaint = documents.first().unwrap();
        assert_eq!(complaint.str_field("filing_org").unwrap(), "Alston & Bird LLP");
        assert_eq!(
            complaint.get("date"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2016, 5, 2).unwrap()))
        );
        assert_eq!(complaint.get("phase"), None);

        let attachment = complaint.many("attachments").unwrap().first().unwrap();
        assert_eq!(attachment.str_field("pages").unwrap(), "42");

        let path = client.download(&attachment, &out_dir).unwrap();
        assert_eq!(
            path.file_name().unwrap(),
            "Verified Complaint - Complaint.pdf"
        );
        assert!(cache_dir
            .join("itc_edis")
            .join("337-TA-1000")
            .join("Verified Complaint - Complaint.pdf")
            .exists());
        client.download(&attachment, &out_dir.join("copy")).unwrap();

        let by_id = client
            .objects("ItcDocument")
            .unwrap()
            .get_pk("580000")
            .unwrap();
        assert_eq!(by_id.str_field("id").unwrap(), "580000");
        assert_eq!(by_id.str_field("investigation_number").unwrap(), "337-TA-1000");
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn edis_rejects_unsupported_queries() {
    let cache = tempfile::tempdir().unwrap();
    let cache_dir = cache.path().to_path_buf();

    tokio::task::spawn_blocking(move || {
        let client =
            PatentClient::new(settings("http://127.0.0.1:9", &cache_dir, true)).unwrap();
        match client.objects("ItcInvestigation").unwrap().count() {
            Err(PatentClientError::NotImplemented(msg)) => {
                assert!(msg.contains("filter by investigation_number"), "{}", msg)
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            client.objects("ItcAttachment").unwrap().count(),
            Err(PatentClientError::InvalidInput(_))
        ));
        assert!(matches!(
            client
                .objects("ItcDocument")
                .unwrap()
                .filter([("docket", "1")])
                .count(),
            Err(PatentClientError::InvalidInput(_))
        ));

        let anonymous =
            PatentClient::new(settings("http://127.0.0.1:9", &cache_dir, false)).unwrap();
        assert!(matches!(
            anonymous
                .objects("ItcInvestigation")
                .unwrap()
                .get_pk("337-TA-1000"),
            Err(PatentClientError::Config(_))
        ));
    })
    .await
    .unwrap();
}
