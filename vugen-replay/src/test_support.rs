use base64::{engine::general_purpose::STANDARD, Engine};
use std::{fs, path::Path};

pub fn data_set(value: &str) -> String {
    format!(
        "<HTTPDataSet><HTTPData><ActualData>{}</ActualData></HTTPData></HTTPDataSet>",
        STANDARD.encode(value)
    )
}

pub fn entity(name: &str, value: &str) -> String {
    format!(
        "<HTTPHeaderEntity name=\"{}\">{}</HTTPHeaderEntity>",
        name,
        data_set(value)
    )
}

/// A recorded `HTTPTask`; `nested` holds the tasks of its resources.
pub struct Task<'a> {
    pub hostname: &'a str,
    pub url: &'a str,
    pub method: &'a str,
    pub request_headers: Vec<(&'a str, &'a str)>,
    pub request_body: Option<&'a str>,
    pub status_line: &'a str,
    pub response_headers: Vec<(&'a str, &'a str)>,
    pub nested: Vec<Task<'a>>,
}

impl<'a> Task<'a> {
    pub fn get(hostname: &'a str, url: &'a str, status_line: &'a str) -> Self {
        Self {
            hostname,
            url,
            method: "GET",
            request_headers: vec![("Host", hostname)],
            request_body: None,
            status_line,
            response_headers: Vec::new(),
            nested: Vec::new(),
        }
    }

    pub fn to_xml(&self) -> String {
        let request_headers: String = self
            .request_headers
            .iter()
            .map(|(name, value)| entity(name, value))
            .collect();
        let request_body = self
            .request_body
            .map(|body| format!("<HTTPBody>{}</HTTPBody>", data_set(body)))
            .unwrap_or_default();
        let response_headers: String = self
            .response_headers
            .iter()
            .map(|(name, value)| entity(name, value))
            .collect();
        let nested: String = self.nested.iter().map(Task::to_xml).collect();

        format!(
            "<HTTPTask hostname=\"{}\" url=\"{}\">\
             <HTTPRequest method=\"{}\"><HTTPHeaders>{}</HTTPHeaders>{}</HTTPRequest>\
             <HTTPResponse><HTTPHeaders><HTTPAllHeaders>{}</HTTPAllHeaders>{}</HTTPHeaders></HTTPResponse>\
             {}</HTTPTask>",
            xml_escape(self.hostname),
            xml_escape(self.url),
            self.method,
            request_headers,
            request_body,
            data_set(&format!("{}\r\n\r\n", self.status_line)),
            response_headers,
            nested
        )
    }
}

/// A saved resource: `URL<n>`, `FileName<n>` and the payload written to disk.
pub struct Resource<'a> {
    pub url: &'a str,
    pub file_name: &'a str,
    pub contents: &'a str,
}

/// Writes `data/<name>.inf`, its snapshot document and the payload files under `script_folder`.
pub fn write_transaction(
    script_folder: &Path,
    name: &str,
    resources: &[Resource<'_>],
    tasks: &[Task<'_>],
) {
    let data = script_folder.join("data");
    fs::create_dir_all(&data).unwrap();

    let snapshot_file = format!("snapshot_{}.xml", name.trim_start_matches('t'));
    let mut descriptor = format!(
        "[{}]\r\nTotal={}\r\nRequestHeaderFile={}_RequestHeader.txt\r\nRequestBodyFile=NONE\r\n\
         ResponseHeaderFile={}_ResponseHeader.txt\r\nContentType=text/html\r\nSnapshotXmlFile={}\r\n",
        name,
        resources.len().saturating_sub(1),
        name,
        name,
        snapshot_file
    );
    for (position, resource) in resources.iter().enumerate() {
        descriptor.push_str(&format!(
            "FileName{}={}\r\nURL{}={}\r\n",
            position + 1,
            resource.file_name,
            position + 1,
            resource.url
        ));
        fs::write(data.join(resource.file_name), resource.contents).unwrap();
    }
    fs::write(data.join(format!("{}.inf", name)), descriptor).unwrap();

    let tasks: String = tasks.iter().map(Task::to_xml).collect();
    fs::write(
        data.join(snapshot_file),
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><HTTPSnapshot id=\"1\">{}</HTTPSnapshot>",
            tasks
        ),
    )
    .unwrap();
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
