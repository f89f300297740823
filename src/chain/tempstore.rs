// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::certificate::Certificate;
use super::errors::Error;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// A certificate written to disk, plus the CRL file written next to it, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub crl_path: Option<PathBuf>,
}

impl StagedFile {
    pub fn had_crl(&self) -> bool {
        self.crl_path.is_some()
    }
}

/// A uniquely named working directory holding PEM certificates and CRLs for
/// the external chain verifier.
///
/// Everything is removed by [`ScopedDirectory::release_all`], or on drop if
/// the owner bails out early.  Removal is best-effort: failures are logged
/// and never reported.
#[derive(Debug)]
pub struct ScopedDirectory {
    dir: Option<TempDir>,
    path: PathBuf,
    files: Vec<PathBuf>,
    seq: usize,
}

impl ScopedDirectory {
    /// Create a fresh directory under `root`, or under the system temporary
    /// directory when no root is given.
    pub fn create(root: Option<&Path>, prefix: &str) -> Result<ScopedDirectory, Error> {
        let mut b = tempfile::Builder::new();
        b.prefix(prefix);

        let dir = match root {
            Some(r) => {
                if r.exists() && !r.is_dir() {
                    return Err(Error::DirectoryCreationFailed(format!(
                        "{} exists and is not a directory",
                        r.display()
                    )));
                }

                fs::create_dir_all(r).map_err(|e| {
                    Error::DirectoryCreationFailed(format!("{}: {e}", r.display()))
                })?;

                b.tempdir_in(r)
            }
            None => b.tempdir(),
        }
        .map_err(|e| Error::DirectoryCreationFailed(e.to_string()))?;

        let path = dir.path().to_path_buf();

        debug!(dir = %path.display(), "created scoped directory");

        Ok(ScopedDirectory {
            dir: Some(dir),
            path,
            files: Vec::new(),
            seq: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Files written so far
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Write `cert` as a PEM file.  A non-empty `crl` goes into a sibling
    /// `.crl` file.
    pub fn write_certificate_file(
        &mut self,
        cert: &Certificate,
        crl: Option<&str>,
    ) -> Result<StagedFile, Error> {
        let n = self.next_seq();

        let path = self.write(&format!("cert-{n}.pem"), cert.to_pem().as_bytes())?;

        let crl_path = match crl {
            Some(c) if !c.trim().is_empty() => {
                Some(self.write(&format!("crl-{n}.crl"), c.as_bytes())?)
            }
            _ => None,
        };

        Ok(StagedFile { path, crl_path })
    }

    /// Write a standalone PEM CRL file
    pub fn write_crl_file(&mut self, crl: &str) -> Result<PathBuf, Error> {
        let n = self.next_seq();
        self.write(&format!("crl-{n}.crl"), crl.as_bytes())
    }

    /// Delete every file written, then the directory itself
    pub fn release_all(mut self) {
        self.release();
    }

    fn next_seq(&mut self) -> usize {
        self.seq += 1;
        self.seq
    }

    fn write(&mut self, name: &str, contents: &[u8]) -> Result<PathBuf, Error> {
        let path = self.path.join(name);

        let mut f = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;

        // track before writing so that a short write still gets cleaned up
        self.files.push(path.clone());

        f.write_all(contents)
            .map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;

        Ok(path)
    }

    fn release(&mut self) {
        for f in self.files.drain(..) {
            if let Err(e) = fs::remove_file(&f) {
                if e.kind() != ErrorKind::NotFound {
                    warn!(file = %f.display(), error = %e, "failed to remove temporary file");
                }
            }
        }

        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                warn!(dir = %self.path.display(), error = %e, "failed to remove temporary directory");
            } else {
                debug!(dir = %self.path.display(), "released scoped directory");
            }
        }
    }
}

impl Drop for ScopedDirectory {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestCa;

    fn is_empty(p: &Path) -> bool {
        fs::read_dir(p).unwrap().next().is_none()
    }

    #[test]
    fn write_and_release() {
        let root = tempfile::tempdir().unwrap();
        let ca = TestCa::new("Store Root", None);

        let mut d = ScopedDirectory::create(Some(root.path()), "store-").unwrap();
        assert!(d.path().starts_with(root.path()));

        let plain = d
            .write_certificate_file(&Certificate::new(ca.der.clone()), None)
            .unwrap();
        assert!(!plain.had_crl());
        assert!(fs::read_to_string(&plain.path)
            .unwrap()
            .starts_with("-----BEGIN CERTIFICATE-----"));

        let crl_pem = "-----BEGIN X509 CRL-----\nAAAA\n-----END X509 CRL-----\n";
        let with_crl = d
            .write_certificate_file(&Certificate::new(ca.der.clone()), Some(crl_pem))
            .unwrap();
        assert!(with_crl.had_crl());
        assert_eq!(
            fs::read_to_string(with_crl.crl_path.as_ref().unwrap()).unwrap(),
            crl_pem
        );

        let empty_crl = d
            .write_certificate_file(&Certificate::new(ca.der.clone()), Some(""))
            .unwrap();
        assert!(!empty_crl.had_crl());

        d.write_crl_file(crl_pem).unwrap();

        assert_eq!(d.files().len(), 5);

        let dir = d.path().to_path_buf();
        d.release_all();

        assert!(!dir.exists());
        assert!(is_empty(root.path()));
    }

    #[test]
    fn release_on_drop() {
        let root = tempfile::tempdir().unwrap();

        {
            let mut d = ScopedDirectory::create(Some(root.path()), "drop-").unwrap();
            d.write_crl_file("x").unwrap();
        }

        assert!(is_empty(root.path()));
    }

    #[test]
    fn release_tolerates_missing_files() {
        let root = tempfile::tempdir().unwrap();

        let mut d = ScopedDirectory::create(Some(root.path()), "gone-").unwrap();
        let p = d.write_crl_file("x").unwrap();
        fs::remove_file(p).unwrap();

        d.release_all();

        assert!(is_empty(root.path()));
    }

    #[test]
    fn root_is_a_file() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("not-a-dir");
        fs::write(&file, b"x").unwrap();

        let r = ScopedDirectory::create(Some(&file), "x-");

        assert!(matches!(r, Err(Error::DirectoryCreationFailed(_))));
    }

    #[test]
    fn unique_directories() {
        let a = ScopedDirectory::create(None, "uniq-").unwrap();
        let b = ScopedDirectory::create(None, "uniq-").unwrap();

        assert_ne!(a.path(), b.path());
    }
}
