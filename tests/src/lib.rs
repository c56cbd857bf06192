#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use reqwest::{header, Client, StatusCode};
    use std::{fs, net::SocketAddr, path::Path};
    use tempfile::TempDir;
    use vugen_replay::{bind, MimeTable, ReplayConfiguration, ScriptDirectory};

    const HOST: &str = "example.test";

    fn entity(name: &str, value: &str) -> String {
        format!(
            "<HTTPHeaderEntity name=\"{}\">{}</HTTPHeaderEntity>",
            name,
            data_set(value)
        )
    }

    fn data_set(value: &str) -> String {
        format!(
            "<HTTPDataSet><HTTPData><ActualData>{}</ActualData></HTTPData></HTTPDataSet>",
            STANDARD.encode(value)
        )
    }

    fn task(
        url: &str,
        method: &str,
        request: &[(&str, &str)],
        body: Option<&str>,
        status_line: &str,
        response: &[(&str, &str)],
        nested: &str,
    ) -> String {
        let request_headers: String = request.iter().map(|(n, v)| entity(n, v)).collect();
        let response_headers: String = response.iter().map(|(n, v)| entity(n, v)).collect();
        let body = body
            .map(|body| format!("<HTTPBody>{}</HTTPBody>", data_set(body)))
            .unwrap_or_default();

        format!(
            "<HTTPTask hostname=\"{host}\" url=\"{url}\">\
             <HTTPRequest method=\"{method}\"><HTTPHeaders>{request_headers}</HTTPHeaders>{body}</HTTPRequest>\
             <HTTPResponse><HTTPHeaders><HTTPAllHeaders>{status}</HTTPAllHeaders>{response_headers}\
             </HTTPHeaders></HTTPResponse>{nested}</HTTPTask>",
            host = HOST,
            url = url,
            method = method,
            request_headers = request_headers,
            body = body,
            status = data_set(&format!("{}\r\n\r\n", status_line)),
            response_headers = response_headers,
            nested = nested
        )
    }

    /// A one-transaction script: a page, its stylesheet, a login POST and a missing image.
    fn write_script(script: &Path) {
        let data = script.join("data");
        fs::create_dir_all(&data).unwrap();

        fs::write(
            data.join("t1.inf"),
            "[t1]\r\nTotal=3\r\nContentType=text/html\r\nSnapshotXmlFile=snapshot_1.xml\r\n\
             FileName1=t1.htm\r\nURL1=http://example.test/\r\n\
             FileName2=t1_style.css\r\nURL2=http://example.test/style.css\r\n\
             FileName3=t1_login.htm\r\nURL3=http://example.test/login\r\n\
             FileName4=t1_logo.png\r\nURL4=http://example.test/logo.png\r\n",
        )
        .unwrap();
        fs::write(data.join("t1.htm"), "<html>welcome</html>").unwrap();
        fs::write(data.join("t1_style.css"), "body { margin: 0 }").unwrap();
        fs::write(data.join("t1_login.htm"), "<html>logged in</html>").unwrap();

        let host = [("Host", HOST)];
        let stylesheet = task(
            "http://example.test/style.css",
            "GET",
            &host,
            None,
            "HTTP/1.1 200 OK",
            &[("Date", "Mon, 01 Jan 2024 00:00:00 GMT")],
            "",
        );
        let logo = task(
            "http://example.test/logo.png",
            "GET",
            &host,
            None,
            "HTTP/1.1 200 OK",
            &[("Content-Type", "image/png")],
            "",
        );
        let page = task(
            "http://example.test/",
            "GET",
            &host,
            None,
            "HTTP/1.1 200 OK",
            &[
                ("Content-Type", "text/html"),
                ("Content-Length", "99999"),
                ("Set-Cookie", "session=abc; path=/"),
                ("Set-Cookie", "theme=dark"),
            ],
            &format!("{}{}", stylesheet, logo),
        );
        let login = task(
            "http://example.test/login",
            "POST",
            &[
                ("Host", HOST),
                ("Content-Type", "application/x-www-form-urlencoded"),
                ("Content-Length", "6"),
            ],
            Some("user=a"),
            "HTTP/1.1 200 OK",
            &[("Content-Type", "text/html")],
            "",
        );

        fs::write(
            data.join("snapshot_1.xml"),
            format!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?><HTTPSnapshot id=\"1\">{}{}</HTTPSnapshot>",
                page, login
            ),
        )
        .unwrap();
    }

    async fn start_replay() -> (TempDir, SocketAddr) {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("WebTours");
        write_script(&script);

        let mut configuration = ReplayConfiguration::new(Box::new(ScriptDirectory::new(&script)));
        configuration.add_listen_address("127.0.0.1:0".parse().unwrap());
        configuration.set_mime_table(MimeTable::parse("text/css css\nimage/png png\n"));

        let server = bind(configuration).unwrap();
        let addr = server.local_addrs()[0];
        tokio::spawn(server.run());

        (dir, addr)
    }

    #[tokio::test]
    async fn replays_recorded_page() {
        let (_dir, addr) = start_replay().await;

        let response = Client::new()
            .get(format!("http://{}/", addr))
            .header(header::HOST, HOST)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "20");

        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies, vec!["session=abc; path=/", "theme=dark"]);

        assert_eq!(response.text().await.unwrap(), "<html>welcome</html>");
    }

    #[tokio::test]
    async fn resource_without_content_type_uses_mime_table() {
        let (_dir, addr) = start_replay().await;

        let response = Client::new()
            .get(format!("http://{}/style.css", addr))
            .header(header::HOST, HOST)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
        assert!(response.headers().get(header::DATE).map_or(true, |date| date
            != "Mon, 01 Jan 2024 00:00:00 GMT"));
        assert_eq!(response.text().await.unwrap(), "body { margin: 0 }");
    }

    #[tokio::test]
    async fn post_matches_on_body() {
        let (_dir, addr) = start_replay().await;
        let client = Client::new();

        let response = client
            .post(format!("http://{}/login", addr))
            .header(header::HOST, HOST)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("user=a")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "<html>logged in</html>");

        let response = client
            .post(format!("http://{}/login", addr))
            .header(header::HOST, HOST)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("user=b")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = response.text().await.unwrap();
        assert!(html.contains("<tr><td>Body</td><td>6 bytes: user=a</td><td>6 bytes: user=b</td></tr>"));
    }

    #[tokio::test]
    async fn unknown_url_is_404_listing_recorded_urls() {
        let (_dir, addr) = start_replay().await;

        let response = Client::new()
            .get(format!("http://{}/typo", addr))
            .header(header::HOST, HOST)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = response.text().await.unwrap();
        assert!(html.contains("http://example.test/typo"));
        assert!(html.contains("<li>http://example.test/style.css</li>"));
        assert!(html.contains("<li>http://example.test/login</li>"));
    }

    #[tokio::test]
    async fn missing_payload_is_500() {
        let (_dir, addr) = start_replay().await;

        let response = Client::new()
            .get(format!("http://{}/logo.png", addr))
            .header(header::HOST, HOST)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response
            .text()
            .await
            .unwrap()
            .contains("Response file not found"));
    }

    #[tokio::test]
    async fn broken_recording_is_500() {
        let (dir, addr) = start_replay().await;
        fs::write(
            dir.path().join("WebTours").join("data").join("t2.inf"),
            "[t2]\r\nTotal=0\r\n",
        )
        .unwrap();

        let response = Client::new()
            .get(format!("http://{}/", addr))
            .header(header::HOST, HOST)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
