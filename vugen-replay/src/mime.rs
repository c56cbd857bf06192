use crate::error::Error;
use hyper::Uri;
use std::{collections::HashMap, fs, path::Path};

const DEFAULT_MIME_TYPE: &str = "text/html";

/// File extension to MIME type lookup read from an Apache `mime.types` file.
#[derive(Debug, Clone, Default)]
pub struct MimeTable {
    types: HashMap<String, String>,
}

impl MimeTable {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut types = HashMap::new();

        for line in contents.lines() {
            if line.starts_with('#') {
                continue;
            }

            let mut columns = line.split_whitespace();
            let mime_type = match columns.next() {
                Some(mime_type) => mime_type,
                None => continue,
            };

            for extension in columns {
                types.insert(extension.to_lowercase(), mime_type.to_string());
            }
        }

        Self { types }
    }

    pub fn for_extension(&self, extension: &str) -> Option<&str> {
        self.types
            .get(&extension.to_lowercase())
            .map(String::as_str)
    }

    /// MIME type for the extension of the URL's path; a path without extension is HTML.
    pub fn for_url(&self, url: &str) -> Result<&str, Error> {
        let path = url
            .parse::<Uri>()
            .map(|uri| uri.path().to_string())
            .unwrap_or_else(|_| url.to_string());
        let file_name = path.rsplit('/').next().unwrap_or("");

        match file_name.rsplit_once('.') {
            Some((_, extension)) if !extension.is_empty() => self
                .for_extension(extension)
                .ok_or_else(|| Error::UnknownMimeType(extension.to_string())),
            _ => Ok(DEFAULT_MIME_TYPE),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
