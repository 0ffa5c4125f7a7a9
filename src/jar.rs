//! Single-pass jar access: entry classification for the analyzers and the
//! compression-independent content hash.
//!
//! Callers map the jar file into memory once; both the hash and the entry
//! walk run over the same buffer, so the file is read from disk a single
//! time. Class file contents are never retained, only paths and timestamps.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::manifest::Manifest;

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
pub const POM_XML: &str = "pom.xml";
pub const POM_PROPS: &str = "pom.properties";

/// A jar under analysis: its filename plus the uncompressed-content hash that
/// serves as its identity for online matching.
#[derive(Debug, Clone)]
pub struct Jar {
    pub name: String,
    pub sha256: String,
}

/// A class file entry. The zip format carries no creation time, so only the
/// last-modified timestamp is available.
#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub path: String,
    pub last_modified: Option<NaiveDateTime>,
}

/// A fully buffered small entry (pom.xml / pom.properties).
#[derive(Debug, Clone)]
pub struct FileBuffer {
    pub path: String,
    pub content: Vec<u8>,
}

/// Everything the offline analyzers need from one jar.
#[derive(Debug, Default)]
pub struct JarContents {
    pub manifest: Option<Manifest>,
    pub poms: Vec<FileBuffer>,
    pub classes: Vec<ClassEntry>,
}

/// Walk the archive once, classifying each non-directory entry. Pom files
/// (basename exactly `pom.xml` or `pom.properties`, case-insensitive) are
/// buffered whole; class files contribute path and timestamp; the manifest is
/// parsed; everything else is discarded.
pub fn read_contents(bytes: &[u8]) -> Result<JarContents> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).context("Failed to read zip structure")?;

    let mut contents = JarContents::default();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let path = entry.name().to_string();
        let basename = path.rsplit('/').next().unwrap_or(&path).to_ascii_lowercase();

        if basename == POM_XML || basename == POM_PROPS {
            let mut content = Vec::new();
            entry.read_to_end(&mut content)?;
            contents.poms.push(FileBuffer { path, content });
        } else if basename.ends_with(".class") {
            contents.classes.push(ClassEntry {
                last_modified: entry_timestamp(&entry),
                path,
            });
        } else if path == MANIFEST_PATH && contents.manifest.is_none() {
            let mut raw = Vec::new();
            entry.read_to_end(&mut raw)?;
            contents.manifest = Some(Manifest::parse(&String::from_utf8_lossy(&raw)));
        }
    }
    Ok(contents)
}

/// Base64 SHA-256 over the concatenation of uncompressed entry bytes in
/// entry-enumeration order. Jars that differ only in compression level or
/// method hash identically.
pub fn sha256_uncompressed(bytes: &[u8]) -> Result<String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).context("Failed to read zip structure")?;

    let mut digest = Sha256::new();
    let mut buffer = [0u8; 32 * 1024];
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        loop {
            let count = entry.read(&mut buffer)?;
            if count == 0 {
                break;
            }
            digest.update(&buffer[..count]);
        }
    }
    Ok(BASE64.encode(digest.finalize()))
}

fn entry_timestamp(entry: &zip::read::ZipFile) -> Option<NaiveDateTime> {
    let dt = entry.last_modified();
    // The MS-DOS epoch is what zip writers emit when no timestamp is known.
    if (dt.year(), dt.month(), dt.day()) == (1980, 1, 1)
        && (dt.hour(), dt.minute(), dt.second()) == (0, 0, 0)
    {
        return None;
    }
    chrono::NaiveDate::from_ymd_opt(dt.year() as i32, dt.month() as u32, dt.day() as u32)?
        .and_hms_opt(dt.hour() as u32, dt.minute() as u32, dt.second() as u32)
}
