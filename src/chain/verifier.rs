// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use openssl::error::ErrorStack;
use openssl::ssl::SslFiletype;
use openssl::stack::Stack;
use openssl::x509::store::{X509Lookup, X509StoreBuilder};
use openssl::x509::verify::X509VerifyFlags;
use openssl::x509::{X509StoreContext, X509};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Everything the chain verifier needs, as laid out on disk by the validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyRequest {
    /// Hashed directory holding the trust anchors and all CRLs
    pub ca_path: PathBuf,
    /// Intermediate certificates, one PEM file each
    pub untrusted: Vec<PathBuf>,
    /// The leaf certificate
    pub subject: PathBuf,
    /// Whether revocation data must be consulted
    pub crl_check: bool,
}

impl VerifyRequest {
    /// Arguments for `openssl verify`
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "verify".into(),
            "-no-CAfile".into(),
            "-no-CApath".into(),
            "-CApath".into(),
            self.ca_path.clone().into(),
        ];

        for u in &self.untrusted {
            args.push("-untrusted".into());
            args.push(u.clone().into());
        }

        if self.crl_check {
            args.push("-crl_check".into());
        }

        args.push(self.subject.clone().into());

        args
    }
}

/// The X.509 path validation capability used by
/// [`ChainValidator`](super::ChainValidator).  Implementations only report
/// pass or fail.
pub trait ChainVerifier {
    /// Build whatever index the CA directory needs before lookups
    fn rehash(&self, dir: &Path) -> bool;

    /// Validate the subject against the CA directory
    fn verify(&self, req: &VerifyRequest) -> bool;
}

impl<T: ChainVerifier + ?Sized> ChainVerifier for &T {
    fn rehash(&self, dir: &Path) -> bool {
        (**self).rehash(dir)
    }

    fn verify(&self, req: &VerifyRequest) -> bool {
        (**self).verify(req)
    }
}

impl<T: ChainVerifier + ?Sized> ChainVerifier for Box<T> {
    fn rehash(&self, dir: &Path) -> bool {
        (**self).rehash(dir)
    }

    fn verify(&self, req: &VerifyRequest) -> bool {
        (**self).verify(req)
    }
}

/// Runs the `openssl` command line tool
#[derive(Debug, Clone)]
pub struct OpensslCommand {
    program: PathBuf,
    timeout: Duration,
}

impl OpensslCommand {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Spawn the tool and poll until it exits.  A child still running when
    /// the timeout expires is killed and counts as a failure.
    fn run(&self, args: &[OsString]) -> bool {
        debug!(program = %self.program.display(), ?args, "running");

        let mut child = match Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(c) => c,
            Err(e) => {
                warn!(program = %self.program.display(), error = %e, "spawn failed");
                return false;
            }
        };

        let start = Instant::now();

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(%status, "exited");
                    return status.success();
                }
                Ok(None) if start.elapsed() >= self.timeout => {
                    warn!(timeout = ?self.timeout, "killing unresponsive child");
                    let _ = child.kill();
                    let _ = child.wait();
                    return false;
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    warn!(error = %e, "waiting for child failed");
                    return false;
                }
            }
        }
    }
}

impl Default for OpensslCommand {
    fn default() -> Self {
        Self::new("openssl", Duration::from_secs(30))
    }
}

impl ChainVerifier for OpensslCommand {
    fn rehash(&self, dir: &Path) -> bool {
        self.run(&["rehash".into(), dir.as_os_str().to_owned()])
    }

    fn verify(&self, req: &VerifyRequest) -> bool {
        self.run(&req.to_args())
    }
}

/// In-process verifier built on the `openssl` crate's `X509Store`.  It reads
/// the same files the command line tool would: `.pem` certificates and
/// `.crl` revocation lists from the CA directory, plus the untrusted and
/// subject files.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeVerifier;

fn ssl_err(e: ErrorStack) -> Error {
    Error::Crypto(format!("{e:?}"))
}

fn io_err(p: &Path, e: std::io::Error) -> Error {
    Error::Io(format!("{}: {e}", p.display()))
}

fn load_pem_certs(p: &Path) -> Result<Vec<X509>, Error> {
    let buf = fs::read(p).map_err(|e| io_err(p, e))?;
    X509::stack_from_pem(&buf).map_err(ssl_err)
}

impl NativeVerifier {
    fn try_verify(&self, req: &VerifyRequest) -> Result<bool, Error> {
        let mut builder = X509StoreBuilder::new().map_err(ssl_err)?;

        let mut entries: Vec<PathBuf> = fs::read_dir(&req.ca_path)
            .map_err(|e| io_err(&req.ca_path, e))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        entries.sort();

        {
            let lookup = builder.add_lookup(X509Lookup::file()).map_err(ssl_err)?;

            for p in &entries {
                match p.extension().and_then(|e| e.to_str()) {
                    Some("pem") => lookup
                        .load_cert_file(p, SslFiletype::PEM)
                        .map_err(ssl_err)?,
                    Some("crl") if req.crl_check => {
                        lookup.load_crl_file(p, SslFiletype::PEM).map_err(ssl_err)?;
                    }
                    _ => {}
                }
            }
        }

        if req.crl_check {
            builder
                .set_flags(X509VerifyFlags::CRL_CHECK)
                .map_err(ssl_err)?;
        }

        let store = builder.build();

        let subject = load_pem_certs(&req.subject)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidChain("subject file holds no certificate".to_string()))?;

        let mut chain = Stack::new().map_err(ssl_err)?;
        for p in &req.untrusted {
            for c in load_pem_certs(p)? {
                chain.push(c).map_err(ssl_err)?;
            }
        }

        let mut ctx = X509StoreContext::new().map_err(ssl_err)?;

        ctx.init(&store, &subject, &chain, |c| {
            let ok = c.verify_cert()?;
            if !ok {
                debug!(
                    error = %c.error(),
                    depth = c.error_depth(),
                    "chain rejected"
                );
            }
            Ok(ok)
        })
        .map_err(ssl_err)
    }
}

impl ChainVerifier for NativeVerifier {
    fn rehash(&self, dir: &Path) -> bool {
        // certificates are loaded file by file, there is no index to build
        dir.is_dir()
    }

    fn verify(&self, req: &VerifyRequest) -> bool {
        match self.try_verify(req) {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "native verification failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Certificate, ChainValidator};
    use crate::testutil::{StaticHttp, TestCa, FAR_AWAY, LONG_AGO};

    fn req(crl_check: bool) -> VerifyRequest {
        VerifyRequest {
            ca_path: PathBuf::from("/tmp/ta"),
            untrusted: vec![PathBuf::from("/tmp/i1.pem"), PathBuf::from("/tmp/i2.pem")],
            subject: PathBuf::from("/tmp/leaf.pem"),
            crl_check,
        }
    }

    #[test]
    fn args_without_crl() {
        let args = req(false).to_args();

        assert_eq!(
            args,
            [
                "verify",
                "-no-CAfile",
                "-no-CApath",
                "-CApath",
                "/tmp/ta",
                "-untrusted",
                "/tmp/i1.pem",
                "-untrusted",
                "/tmp/i2.pem",
                "/tmp/leaf.pem"
            ]
            .iter()
            .map(OsString::from)
            .collect::<Vec<_>>()
        );
    }

    #[test]
    fn args_with_crl() {
        let args = req(true).to_args();

        assert_eq!(args[args.len() - 2], OsString::from("-crl_check"));
        assert_eq!(args.last(), Some(&OsString::from("/tmp/leaf.pem")));
    }

    #[test]
    fn missing_program_fails() {
        let v = OpensslCommand::new("/nonexistent/openssl", Duration::from_secs(1));

        assert!(!v.rehash(Path::new("/tmp")));
        assert!(!v.verify(&req(false)));
    }

    #[test]
    fn native_rehash_needs_directory() {
        let d = tempfile::tempdir().unwrap();

        assert!(NativeVerifier.rehash(d.path()));
        assert!(!NativeVerifier.rehash(&d.path().join("missing")));
    }

    #[test]
    fn native_missing_files_fail() {
        assert!(!NativeVerifier.verify(&req(false)));
    }

    fn openssl_available() -> bool {
        Command::new("openssl")
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn is_empty(p: &Path) -> bool {
        fs::read_dir(p).unwrap().next().is_none()
    }

    #[test]
    fn openssl_command_validates_chains() {
        if !openssl_available() {
            return;
        }

        const CLEAN_CRL: &str = "http://crl.test/clean.crl";
        const REVOKED_CRL: &str = "http://crl.test/revoked.crl";

        let ca = TestCa::new("Tool Root", None);
        let int = ca.issue_ca("Tool Intermediate", &[0x20]);
        let clean = int.issue("Tool Clean Leaf", &[0x21], Some(CLEAN_CRL), LONG_AGO, FAR_AWAY);
        let revoked = int.issue("Tool Revoked Leaf", &[0x22], Some(REVOKED_CRL), LONG_AGO, FAR_AWAY);
        let direct = ca.issue("Tool Direct Leaf", &[0x23], None, LONG_AGO, FAR_AWAY);

        let http = StaticHttp::new()
            .with(CLEAN_CRL, 200, int.crl(&[0x55]))
            .with(REVOKED_CRL, 200, int.crl(&[0x22]));

        let root = tempfile::tempdir().unwrap();
        let v = ChainValidator::new(&http, OpensslCommand::default()).with_work_dir(root.path());

        let anchor = [Certificate::new(ca.der.clone())];
        let intermediate = Certificate::new(int.der.clone());

        assert_eq!(
            v.check(&[Certificate::new(clean), intermediate.clone()], &anchor),
            Ok(())
        );

        assert!(matches!(
            v.check(&[Certificate::new(revoked), intermediate], &anchor),
            Err(Error::InvalidChain(_))
        ));

        assert_eq!(v.check(&[Certificate::new(direct.clone())], &anchor), Ok(()));

        assert!(matches!(
            v.check(
                &[Certificate::new(direct)],
                &[Certificate::new(ca.tampered_key_der())]
            ),
            Err(Error::InvalidChain(_))
        ));

        assert!(is_empty(root.path()));
    }
}
