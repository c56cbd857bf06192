use crate::{data::NearMiss, error::Error};
use hyper::{header, Body, Response, StatusCode};

const STYLE: &str = "body { font-family: Sans-Serif; background-color: #e1ddd9; font-size: 12px; \
                     color: #564b47; padding: 20px; margin: 0px; } \
                     .content { margin: 0px auto; padding: 10px; width: 550px; min-height: 300px; \
                     background-color: #ffffff; border: 1px dashed #564b47; overflow: auto; }";

/// HTML page describing `error`, answered with `error.status_code()`.
pub fn render(error: &Error) -> Response<Body> {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let html = render_html(error);

    let mut response = Response::new(Body::from(html));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/html; charset=utf-8"),
    );

    response
}

pub fn render_html(error: &Error) -> String {
    let title = escape(error.title());

    format!(
        "<html>\n  <head>\n    <title>VuGen Local Replay: {title}</title>\n    \
         <style type=\"text/css\">{style}</style>\n  </head>\n  <body>\n    \
         <div class=\"content\">\n      <h1>{title}</h1>\n      <p>{message}</p>\n{details}    \
         </div>\n  </body>\n</html>\n",
        title = title,
        style = STYLE,
        message = escape(&error.to_string()),
        details = details(error)
    )
}

fn details(error: &Error) -> String {
    match error {
        Error::NoMatchingResponse {
            known_urls,
            near_misses,
            ..
        } => {
            let near_misses: String = near_misses.iter().map(near_miss).collect();
            let items: String = known_urls
                .iter()
                .map(|known| format!("        <li>{}</li>\n", escape(known)))
                .collect();
            format!(
                "{}      <p>URLs in the recording:</p>\n      <ul>\n{}      </ul>\n",
                near_misses, items
            )
        }
        Error::HostsNotLocal(hosts) => format!(
            "      <p>You must add the following lines to your hosts file \
             (C:\\WINDOWS\\system32\\drivers\\etc\\hosts or /etc/hosts):</p>\n      \
             <textarea rows=\"{}\" cols=\"60\" wrap=\"off\">\n\
             # Added for VuGen Local Replay (remove after script development is complete)\n{}\
             </textarea>\n      <p>Note that you must have Administrator rights to edit the hosts file.</p>\n",
            hosts.len() + 2,
            hosts
                .iter()
                .map(|host| format!("127.0.0.1       {}\n", escape(host)))
                .collect::<String>()
        ),
        Error::PortsNotListening(ports) => format!(
            "      <p>Find the line that says \"Listen 80\" in your web server configuration and add \
             the following lines:</p>\n      <textarea rows=\"{}\" cols=\"60\" wrap=\"off\">\n{}\
             </textarea>\n      <p>If any ports are already in use on localhost, the server will fail \
             to start.</p>\n",
            ports.len() + 1,
            ports
                .iter()
                .map(|port| format!("Listen {}\n", port))
                .collect::<String>()
        ),
        _ => String::new(),
    }
}

fn near_miss(near_miss: &NearMiss) -> String {
    let rows: String = near_miss
        .differences
        .iter()
        .map(|difference| {
            format!(
                "        <tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape(&difference.field),
                escape(&difference.recorded),
                escape(&difference.live)
            )
        })
        .collect();

    format!(
        "      <p>Recorded request #{} has this URL but differs from the request received:</p>\n      \
         <table>\n        <tr><th>Field</th><th>Recorded</th><th>Received</th></tr>\n{}      </table>\n",
        near_miss.position, rows
    )
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }

    escaped
}
