//! End-to-end pipeline tests: digest handshake through the executor, and
//! stream-write followed by paged read-back.

use docdb_eval::{
    ClientConfig, Credentials, QueryExecutor, QueryRequest, ResultMode, StreamWriter, read_slice,
};
use tempfile::TempDir;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const THREE_PART_BODY: &str = concat!(
    "--sep\r\n",
    "Content-Type: application/xml\r\n",
    "X-Primitive: element()\r\n",
    "X-URI: /docs/a.xml\r\n",
    "\r\n",
    "<a>one</a>\r\n",
    "--sep\r\n",
    "Content-Type: application/json\r\n",
    "X-Primitive: object-node()\r\n",
    "X-URI: /docs/b.json\r\n",
    "\r\n",
    "{\"b\": 2}\r\n",
    "--sep\r\n",
    "Content-Type: text/plain\r\n",
    "X-Primitive: xs:string\r\n",
    "\r\n",
    "three\r\n",
    "--sep--\r\n",
);

#[tokio::test]
async fn stream_write_then_paged_read_back() {
    let temp = TempDir::new().unwrap();
    let writer = StreamWriter::new(temp.path());

    let index = writer
        .write_to_disk(THREE_PART_BODY, "multipart/mixed; boundary=sep")
        .await
        .unwrap();
    assert_eq!(index.parts.len(), 3);

    let page = read_slice(&index.dir, 0, 2).await.unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].index, 0);
    assert_eq!(page.records[0].record.content, "<a>one</a>");
    assert_eq!(page.records[0].record.content_type, "application/xml");
    assert_eq!(page.records[0].record.uri, "/docs/a.xml");
    assert_eq!(page.records[1].index, 1);
    assert_eq!(page.records[1].record.content, "{\"b\": 2}");
    assert_eq!(page.records[1].record.content_type, "application/json");
}

#[tokio::test]
async fn digest_challenge_then_buffered_result() {
    let mock_server = MockServer::start().await;

    // The authorized retry gets the real result; mounted first so it takes
    // precedence over the challenge catch-all.
    Mock::given(method("POST"))
        .and(path("/v1/eval"))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "multipart/mixed; boundary=sep")
                .set_body_string(THREE_PART_BODY),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/eval"))
        .respond_with(ResponseTemplate::new(401).insert_header(
            "WWW-Authenticate",
            "Digest realm=\"public\", nonce=\"dcd98b\", qop=auth",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = ClientConfig {
        server_url: mock_server.uri(),
        credentials: Some(Credentials::new("admin", "admin")),
        stream_dir: temp.path().to_path_buf(),
        ..Default::default()
    };
    let executor = QueryExecutor::new(config).unwrap();

    let request = QueryRequest::new("collection()", "xquery", "Documents");
    let envelope = executor.execute(&request).await.unwrap();

    // The envelope reflects the authorized second response
    assert_eq!(envelope.mode, ResultMode::Buffer);
    assert_eq!(envelope.total_records, 3);
    assert_eq!(envelope.rows[0].content, "<a>one</a>");
    assert_eq!(envelope.rows[2].content, "three");
    assert_eq!(envelope.raw_text, THREE_PART_BODY);
}

#[tokio::test]
async fn digest_challenge_then_streamed_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/eval"))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "multipart/mixed; boundary=sep")
                .set_body_string(THREE_PART_BODY),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/eval"))
        .respond_with(ResponseTemplate::new(401).insert_header(
            "WWW-Authenticate",
            "Digest realm=\"public\", nonce=\"dcd98b\", qop=auth",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = ClientConfig {
        server_url: mock_server.uri(),
        credentials: Some(Credentials::new("admin", "admin")),
        stream_dir: temp.path().to_path_buf(),
        ..Default::default()
    };
    let executor = QueryExecutor::new(config).unwrap();

    let mut request = QueryRequest::new("collection()", "xquery", "Documents");
    request.prefer_stream = true;
    let envelope = executor.execute(&request).await.unwrap();

    assert_eq!(envelope.mode, ResultMode::Stream);
    assert!(envelope.rows.is_empty());
    let index = envelope.stream_index.expect("stream mode carries an index");
    assert_eq!(index.parts.len(), 3);

    // Page through what the executor just streamed
    let page = read_slice(&index.dir, 2, 50).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].index, 2);
    assert_eq!(page.records[0].record.content, "three");
}
