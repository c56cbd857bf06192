use crate::error::Error;
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

lazy_static! {
    static ref SECTION_REGEX: Regex = Regex::new(r"^\[(?P<section>[^\]]*)\]$").unwrap();
    static ref ENTRY_REGEX: Regex =
        Regex::new(r"^(?P<key>[^=\s][^=]*?)\s*=\s*(?P<value>.*?)$").unwrap();
    static ref RESOURCE_KEY_REGEX: Regex =
        Regex::new(r"^(?P<kind>URL|FileName)(?P<position>[0-9]+)$").unwrap();
}

const TOTAL_KEY: &str = "Total";
const SNAPSHOT_XML_FILE_KEY: &str = "SnapshotXmlFile";

/// One `URL<n>`/`FileName<n>` pair of a descriptor. Either half may be absent in a damaged file.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct DescriptorResource {
    pub url: Option<String>,
    pub file_name: Option<String>,
}

/// Recorded URLs of one descriptor and the payload files saved for them, keyed by position.
#[derive(Debug, Clone, Default)]
pub struct DescriptorIndex {
    resources: BTreeMap<u32, DescriptorResource>,
    positions: HashMap<String, u32>,
}

impl DescriptorIndex {
    fn insert_url(&mut self, position: u32, url: String) {
        self.resources.entry(position).or_default().url = Some(url);
    }

    fn insert_file_name(&mut self, position: u32, file_name: String) {
        self.resources.entry(position).or_default().file_name = Some(file_name);
    }

    fn build_positions(&mut self) {
        // a URL saved twice resolves to its lowest position
        for (position, resource) in self.resources.iter().rev() {
            if let Some(url) = &resource.url {
                self.positions.insert(url.clone(), *position);
            }
        }
    }

    pub fn position_of(&self, url: &str) -> Option<u32> {
        self.positions.get(url).copied()
    }

    pub fn file_name_at(&self, position: u32) -> Option<&str> {
        self.resources
            .get(&position)
            .and_then(|resource| resource.file_name.as_deref())
    }

    /// The payload file name recorded for `url`, going through the URL's position.
    pub fn file_name_for(&self, url: &str) -> Option<&str> {
        let position = self.position_of(url)?;
        let file_name = self.file_name_at(position);

        if file_name.is_none() {
            warn!("URL{} = {} has no matching FileName{}", position, url, position);
        }

        file_name
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.resources
            .values()
            .filter_map(|resource| resource.url.as_deref())
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// A parsed `t<n>.inf` snapshot descriptor.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub path: PathBuf,
    pub total: usize,
    pub snapshot_document: PathBuf,
    pub index: DescriptorIndex,
}

impl Descriptor {
    /// Directory the descriptor lives in, all relative file names resolve against it.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Resolved path of the payload file saved for `url`, if the descriptor knows one.
    pub fn payload_path(&self, url: &str) -> Option<PathBuf> {
        self.index
            .file_name_for(url)
            .map(|file_name| self.directory().join(file_name))
    }
}

pub fn load_descriptor<P: AsRef<Path>>(path: P) -> Result<Descriptor, Error> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(Error::MissingDescriptorFile(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path)?;
    parse_descriptor(path, &contents)
}

/// Parses descriptor text. The section named after the file's base name is the only one read.
///
/// Values may contain `=`; a `;` anywhere in a value is rejected, the capture tool never writes
/// one and the format has no quoting for it.
pub fn parse_descriptor<P: AsRef<Path>>(path: P, contents: &str) -> Result<Descriptor, Error> {
    let path = path.as_ref();
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
    let malformed = |reason: String| Error::MalformedDescriptor {
        path: path.to_path_buf(),
        reason,
    };

    let section_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut current_section: Option<String> = None;
    let mut entries: HashMap<String, String> = HashMap::new();
    let mut index = DescriptorIndex::default();
    let mut section_found = false;

    for (line_number, line) in contents.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(captures) = SECTION_REGEX.captures(line) {
            let section = captures["section"].trim().to_string();
            section_found |= section == section_name;
            current_section = Some(section);
            continue;
        }

        let captures = ENTRY_REGEX.captures(line).ok_or_else(|| {
            malformed(format!(
                "line {} is neither a section nor a key=value pair: {}",
                line_number + 1,
                line
            ))
        })?;

        let key = &captures["key"];
        let value = &captures["value"];

        if value.contains(';') {
            return Err(malformed(format!(
                "line {}: values may not contain ';' ({})",
                line_number + 1,
                key
            )));
        }

        if current_section.as_deref() != Some(section_name.as_str()) {
            continue;
        }

        if let Some(resource_key) = RESOURCE_KEY_REGEX.captures(key) {
            let position = resource_key["position"]
                .parse()
                .map_err(|_| malformed(format!("invalid resource position in {}", key)))?;

            match &resource_key["kind"] {
                "URL" => index.insert_url(position, value.to_string()),
                _ => index.insert_file_name(position, value.to_string()),
            }
        }

        entries.insert(key.to_string(), value.to_string());
    }

    if !section_found {
        return Err(malformed(format!("missing section [{}]", section_name)));
    }

    let total = entries
        .get(TOTAL_KEY)
        .ok_or_else(|| malformed(format!("missing key {}", TOTAL_KEY)))?
        .parse::<usize>()
        .map_err(|_| malformed(format!("{} is not a number", TOTAL_KEY)))?;

    let snapshot_file = entries
        .get(SNAPSHOT_XML_FILE_KEY)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| malformed(format!("missing key {}", SNAPSHOT_XML_FILE_KEY)))?;

    index.build_positions();

    if index.len() > total + 1 {
        warn!(
            "{} declares Total={} but indexes {} resources",
            path.display(),
            total,
            index.len()
        );
    }

    let directory = path.parent().unwrap_or_else(|| Path::new(""));

    Ok(Descriptor {
        path: path.to_path_buf(),
        total,
        snapshot_document: directory.join(snapshot_file),
        index,
    })
}
