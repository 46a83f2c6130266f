//! Directory-listing parsers and format detection.
//!
//! FTP servers report directory contents in one of three incompatible
//! textual formats:
//! 1. **MLSD facts** (RFC 3659): `type=file;size=1234; file.txt`
//! 2. **Unix-style** (`ls -l`): `-rw-r--r-- 1 owner group 1234 Jan  1 12:00 file.txt`
//! 3. **Windows/IIS-style**: `01-01-26  12:00AM  <DIR>  My Documents`
//!
//! A site either pins one format or asks for auto-detection, which
//! probes MLSD first and falls back to classifying a raw LIST body.

use crate::error::{CrawlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of a remote filesystem entry that survives parsing. Symlinks
/// are skipped at parse time and never reach the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// One parsed listing entry, in the order the server returned it.
/// `size` is `None` for directories (resolved later by aggregation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
}

/// The listing method configured for a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingMethod {
    #[default]
    Auto,
    Mlsd,
    Unix,
    Windows,
}

impl ListingMethod {
    /// The parser this method pins, or `None` for auto-detection.
    pub fn parser(&self) -> Option<ListingParser> {
        match self {
            ListingMethod::Auto => None,
            ListingMethod::Mlsd => Some(ListingParser::Mlsd),
            ListingMethod::Unix => Some(ListingParser::Unix),
            ListingMethod::Windows => Some(ListingParser::Windows),
        }
    }
}

impl FromStr for ListingMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ListingMethod::Auto),
            "mlsd" => Ok(ListingMethod::Mlsd),
            "unix" => Ok(ListingMethod::Unix),
            "windows" => Ok(ListingMethod::Windows),
            other => Err(format!(
                "unknown listing method '{}' (expected auto, mlsd, unix or windows)",
                other
            )),
        }
    }
}

impl fmt::Display for ListingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ListingMethod::Auto => "auto",
            ListingMethod::Mlsd => "mlsd",
            ListingMethod::Unix => "unix",
            ListingMethod::Windows => "windows",
        };
        f.write_str(s)
    }
}

/// The parser resolved for a crawl, held for the connection's lifetime.
/// `Custom` lets library consumers and tests inject their own line
/// format without touching detection.
#[derive(Debug, Clone, Copy)]
pub enum ListingParser {
    Mlsd,
    Unix,
    Windows,
    Custom(fn(&str) -> Result<Vec<ListingEntry>>),
}

impl ListingParser {
    pub fn parse(&self, raw: &str) -> Result<Vec<ListingEntry>> {
        match self {
            ListingParser::Mlsd => parse_mlsd(raw),
            ListingParser::Unix => parse_unix(raw),
            ListingParser::Windows => parse_windows(raw),
            ListingParser::Custom(f) => f(raw),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ListingParser::Mlsd => "mlsd",
            ListingParser::Unix => "unix",
            ListingParser::Windows => "windows",
            ListingParser::Custom(_) => "custom",
        }
    }
}

// ─── MLSD ────────────────────────────────────────────────────────────

/// Parse an MLSD body: each line is `<facts> <name>` with `;`-separated
/// `key=value` facts. `cdir`/`pdir` entries and symlink flavors are
/// skipped; a file without a size fact counts as zero bytes.
pub fn parse_mlsd(raw: &str) -> Result<Vec<ListingEntry>> {
    let mut entries = Vec::new();
    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
        let (facts_str, name) = line.split_once(' ').ok_or_else(|| {
            CrawlError::Protocol(format!("malformed MLSD line: '{}'", line))
        })?;
        if name.is_empty() || name == "." || name == ".." {
            continue;
        }

        let mut kind_fact = None;
        let mut size_fact = None;
        for segment in facts_str.split(';') {
            if let Some((k, v)) = segment.split_once('=') {
                match k.to_lowercase().as_str() {
                    "type" => kind_fact = Some(v.to_lowercase()),
                    "size" => size_fact = v.parse::<u64>().ok(),
                    _ => {}
                }
            }
        }

        match kind_fact.as_deref() {
            Some("dir") => entries.push(ListingEntry {
                name: name.to_string(),
                kind: EntryKind::Dir,
                size: None,
            }),
            Some("file") => entries.push(ListingEntry {
                name: name.to_string(),
                kind: EntryKind::File,
                size: Some(size_fact.unwrap_or(0)),
            }),
            // cdir/pdir and OS-specific types (symlinks etc.) are skipped.
            _ => {}
        }
    }
    Ok(entries)
}

// ─── Unix-style ──────────────────────────────────────────────────────

/// Parse a Unix `ls -l` body. The first byte encodes the type (`d`
/// directory, `-` file, `l` symlink which is skipped); any other
/// marker is a fatal error. The size is field 4, the name is fields
/// 8 onward rejoined.
pub fn parse_unix(raw: &str) -> Result<Vec<ListingEntry>> {
    let mut entries = Vec::new();
    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
        let kind = match line.as_bytes()[0] {
            b'd' => EntryKind::Dir,
            b'-' => EntryKind::File,
            b'l' => continue,
            _ => return Err(CrawlError::UnrecognizedEntry(line.to_string())),
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 9 {
            return Err(CrawlError::Protocol(format!(
                "short unix listing line: '{}'",
                line
            )));
        }
        let name = fields[8..].join(" ");

        let size = match kind {
            EntryKind::File => Some(fields[4].parse::<u64>().map_err(|_| {
                CrawlError::Protocol(format!("bad size field in: '{}'", line))
            })?),
            EntryKind::Dir => None,
        };

        entries.push(ListingEntry { name, kind, size });
    }
    Ok(entries)
}

// ─── Windows-style ───────────────────────────────────────────────────

/// Parse a Windows/IIS body. Field 2 holds either the `<DIR>` marker
/// or a decimal size; the name is fields 3 onward rejoined.
pub fn parse_windows(raw: &str) -> Result<Vec<ListingEntry>> {
    let mut entries = Vec::new();
    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(CrawlError::Protocol(format!(
                "short windows listing line: '{}'",
                line
            )));
        }
        let name = fields[3..].join(" ");

        if fields[2] == "<DIR>" {
            entries.push(ListingEntry {
                name,
                kind: EntryKind::Dir,
                size: None,
            });
        } else {
            let size = fields[2].parse::<u64>().map_err(|_| {
                CrawlError::Protocol(format!("bad size field in: '{}'", line))
            })?;
            entries.push(ListingEntry {
                name,
                kind: EntryKind::File,
                size: Some(size),
            });
        }
    }
    Ok(entries)
}

// ─── Detection ───────────────────────────────────────────────────────

/// Classify a raw LIST body when MLSD was rejected.
///
/// Windows iff some line carries the `<DIR>` marker in the size field
/// and every line starts with a digit (the date column); otherwise
/// Unix iff every line starts with a recognized type letter. Anything
/// else means no usable parser exists for this server.
pub fn detect_from_list(raw: &str) -> Result<ListingParser> {
    let lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return Err(CrawlError::FormatDetection(
            "empty listing, nothing to classify".into(),
        ));
    }

    let has_dir_marker = lines
        .iter()
        .any(|l| l.split_whitespace().nth(2) == Some("<DIR>"));
    let all_start_digit = lines.iter().all(|l| l.as_bytes()[0].is_ascii_digit());
    if has_dir_marker && all_start_digit {
        return Ok(ListingParser::Windows);
    }

    let all_unix_markers = lines
        .iter()
        .all(|l| matches!(l.as_bytes()[0], b'd' | b'-' | b'l'));
    if all_unix_markers {
        return Ok(ListingParser::Unix);
    }

    Err(CrawlError::FormatDetection(format!(
        "listing matches neither windows nor unix style: '{}'",
        lines[0]
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIX_LISTING: &str = "\
drwxr-xr-x   2 ftp  ftp      4096 Jan  5 09:30 pub
drwxr-xr-x   5 ftp  ftp      4096 Feb 11 14:02 mirror archive
-rw-r--r--   1 ftp  ftp      1234 Jan  1 12:00 readme.txt
-rw-r--r--   1 ftp  ftp         0 Mar  3  2024 empty.dat
-rw-r--r--   1 ftp  ftp  99887766 Mar  3  2024 big.iso
lrwxrwxrwx   1 ftp  ftp        11 Jan  1 12:00 latest -> pub/current";

    #[test]
    fn test_unix_mixed_listing() {
        let entries = parse_unix(UNIX_LISTING).unwrap();
        // 2 directories + 3 files; the symlink is excluded.
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].kind, EntryKind::Dir);
        assert_eq!(entries[0].name, "pub");
        assert_eq!(entries[0].size, None);
        assert_eq!(entries[1].name, "mirror archive");
        assert_eq!(entries[2].kind, EntryKind::File);
        assert_eq!(entries[2].size, Some(1234));
        assert_eq!(entries[3].size, Some(0));
        assert_eq!(entries[4].size, Some(99_887_766));
    }

    #[test]
    fn test_unix_unrecognized_marker_is_fatal() {
        let err = parse_unix("?rw-r--r-- 1 ftp ftp 12 Jan 1 12:00 odd").unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, CrawlError::UnrecognizedEntry(_)));
    }

    #[test]
    fn test_unix_short_line_is_transient() {
        let err = parse_unix("-rw-r--r-- 1 ftp 12").unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_windows_listing() {
        let raw = "\
01-05-26  09:30AM       <DIR>          Program Files
01-05-26  09:31AM                 1234 notes.txt
02-11-26  02:02PM                    0 empty.bin";
        let entries = parse_windows(raw).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, EntryKind::Dir);
        assert_eq!(entries[0].name, "Program Files");
        assert_eq!(entries[1].size, Some(1234));
        assert_eq!(entries[2].size, Some(0));
    }

    #[test]
    fn test_mlsd_listing() {
        let raw = "\
type=cdir;modify=20260105093000; .
type=pdir;modify=20260105093000; ..
type=dir;modify=20260105093000; sub
type=file;size=1024;modify=20260101120000; example.bin
type=file;modify=20260101120000; sizeless.txt";
        let entries = parse_mlsd(raw).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, EntryKind::Dir);
        assert_eq!(entries[0].name, "sub");
        assert_eq!(entries[1].size, Some(1024));
        // No size fact: counted as zero bytes.
        assert_eq!(entries[2].size, Some(0));
    }

    #[test]
    fn test_mlsd_skips_symlink_types() {
        let raw = "type=OS.unix=symlink;size=11; link";
        let entries = parse_mlsd(raw).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_detect_windows() {
        let raw = "\
01-05-26  09:30AM       <DIR>          stuff
01-05-26  09:31AM                 1234 notes.txt";
        assert!(matches!(
            detect_from_list(raw).unwrap(),
            ListingParser::Windows
        ));
    }

    #[test]
    fn test_detect_unix() {
        assert!(matches!(
            detect_from_list(UNIX_LISTING).unwrap(),
            ListingParser::Unix
        ));
    }

    #[test]
    fn test_detect_fails_on_unknown_style() {
        let err = detect_from_list("%% not a listing at all").unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, CrawlError::FormatDetection(_)));
    }

    #[test]
    fn test_detect_fails_on_empty() {
        assert!(detect_from_list("\n\n").is_err());
    }

    #[test]
    fn test_method_round_trip() {
        for s in ["auto", "mlsd", "unix", "windows"] {
            let m: ListingMethod = s.parse().unwrap();
            assert_eq!(m.to_string(), s);
        }
        assert!("vms".parse::<ListingMethod>().is_err());
    }

    #[test]
    fn test_custom_parser_variant() {
        fn one_file(_raw: &str) -> crate::error::Result<Vec<ListingEntry>> {
            Ok(vec![ListingEntry {
                name: "only.txt".into(),
                kind: EntryKind::File,
                size: Some(7),
            }])
        }
        let parser = ListingParser::Custom(one_file);
        let entries = parser.parse("ignored").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(parser.name(), "custom");
    }
}
