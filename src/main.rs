// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use fidotrust::chain::{Certificate, ChainValidator};
use fidotrust::config::Config;
use fidotrust::http::BlockingClient;
use fidotrust::jws;
use fidotrust::mds::{MdsClient, MetadataStatement, MetadataTOCPayload};
use std::error::Error;
use std::fs;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
enum FidoTrustCli {
    Toc(TocArgs),
    Statement(StatementArgs),
    VerifyToken(VerifyTokenArgs),
    Check(CheckArgs),
}

#[derive(Debug, clap::Args)]
struct CommonArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Metadata service access token, overrides the one in the configuration
    #[arg(long)]
    token: Option<String>,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Fetch the metadata service TOC, verify its signature and print \
    its payload")]
struct TocArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Fetch the metadata statement of the authenticator with the \
    given AAGUID or AAID")]
struct StatementArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, conflicts_with = "aaid", required_unless_present = "aaid")]
    aaguid: Option<String>,

    #[arg(long)]
    aaid: Option<String>,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Verify a compact JWS signed by its x5c certificate and print the \
    payload")]
struct VerifyTokenArgs {
    #[arg(short, long, default_value = "toc.jwt")]
    file: String,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Validate an attestation certificate chain (leaf first) against \
    trusted roots, or against the roots in the authenticator's metadata \
    statement")]
struct CheckArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Attestation certificate (PEM or DER), leaf first
    #[arg(long = "chain", required = true)]
    chain: Vec<String>,

    /// Trusted root certificate (PEM or DER)
    #[arg(long = "trusted")]
    trusted: Vec<String>,

    /// Take the trusted roots from this authenticator's metadata statement
    #[arg(long, conflicts_with = "trusted")]
    aaguid: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let code = match FidoTrustCli::parse() {
        FidoTrustCli::Toc(args) => finish(toc(&args), "fetching TOC", |j| println!("{j}")),

        FidoTrustCli::Statement(args) => finish(
            statement(&args),
            "fetching metadata statement",
            |j| println!("{j}"),
        ),

        FidoTrustCli::VerifyToken(args) => {
            finish(verify_token(&args), "verification", |p| println!("{p}"))
        }

        FidoTrustCli::Check(args) => finish(check(&args), "chain validation", |_| {
            println!("chain validation successful")
        }),
    };

    process::exit(code);
}

/// Report the outcome of a subcommand and turn it into the process exit code
fn finish<T>(r: Result<T, Box<dyn Error>>, what: &str, on_success: impl FnOnce(T)) -> i32 {
    match r {
        Ok(v) => {
            on_success(v);
            0
        }
        Err(e) => {
            eprintln!("{what} failed: {e}");
            1
        }
    }
}

fn load_config(args: &CommonArgs) -> Result<Config, Box<dyn Error>> {
    let mut cfg = match &args.config {
        Some(p) => Config::load_json(&fs::read_to_string(p)?)?,
        None => Config::default(),
    };

    if let Some(t) = &args.token {
        cfg.mds.token = t.clone();
    }

    Ok(cfg)
}

fn mds_client(cfg: &Config) -> Result<MdsClient<BlockingClient>, Box<dyn Error>> {
    if cfg.mds.token.is_empty() {
        return Err("no metadata service access token configured".into());
    }

    let http = BlockingClient::new(cfg.chain.http_timeout())?;

    Ok(MdsClient::from_config(http, &cfg.mds))
}

fn toc(args: &TocArgs) -> Result<String, Box<dyn Error>> {
    let cfg = load_config(&args.common)?;

    let toc = mds_client(&cfg)?.fetch_toc_payload()?;

    Ok(serde_json::to_string_pretty(&toc)?)
}

fn fetch_statement(
    mds: &MdsClient<BlockingClient>,
    toc: &MetadataTOCPayload,
    aaguid: Option<&str>,
    aaid: Option<&str>,
) -> Result<MetadataStatement, Box<dyn Error>> {
    let entry = match (aaguid, aaid) {
        (Some(g), _) => toc.find_by_aaguid(g),
        (None, Some(a)) => toc.find_by_aaid(a),
        (None, None) => None,
    }
    .ok_or("authenticator not listed in the TOC")?;

    if entry.is_compromised() {
        tracing::warn!(status = ?entry.latest_status(), "authenticator reported as compromised");
    }

    Ok(mds.fetch_statement_for(entry)?)
}

fn statement(args: &StatementArgs) -> Result<String, Box<dyn Error>> {
    let cfg = load_config(&args.common)?;
    let mds = mds_client(&cfg)?;

    let toc = mds.fetch_toc_payload()?;
    let ms = fetch_statement(&mds, &toc, args.aaguid.as_deref(), args.aaid.as_deref())?;

    Ok(serde_json::to_string_pretty(&ms)?)
}

fn verify_token(args: &VerifyTokenArgs) -> Result<String, Box<dyn Error>> {
    let t = fs::read_to_string(&args.file)?;

    let payload = jws::verify_and_extract_payload(t.trim())?;

    Ok(String::from_utf8_lossy(&payload).into_owned())
}

fn read_certificates(paths: &[String]) -> Result<Vec<Certificate>, Box<dyn Error>> {
    let mut certs = Vec::with_capacity(paths.len());

    for p in paths {
        certs.push(Certificate::new(fs::read(p)?));
    }

    Ok(certs)
}

fn check(args: &CheckArgs) -> Result<(), Box<dyn Error>> {
    let cfg = load_config(&args.common)?;

    let authenticator = read_certificates(&args.chain)?;

    let trusted = match &args.aaguid {
        Some(g) => {
            let mds = mds_client(&cfg)?;
            let toc = mds.fetch_toc_payload()?;
            fetch_statement(&mds, &toc, Some(g), None)?.attestation_root_certificates()?
        }
        None => read_certificates(&args.trusted)?,
    };

    let http = BlockingClient::new(cfg.chain.http_timeout())?;
    let mut v = ChainValidator::new(http, cfg.chain.chain_verifier());

    if let Some(d) = &cfg.chain.work_dir {
        v = v.with_work_dir(d);
    }

    v.check(&authenticator, &trusted)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_exits_non_zero() {
        let r: Result<(), Box<dyn Error>> = Err("chain does not validate".into());

        assert_eq!(finish(r, "chain validation", |_| {}), 1);
    }

    #[test]
    fn success_exits_zero() {
        let mut seen = None;

        assert_eq!(finish(Ok(7), "verification", |v| seen = Some(v)), 0);
        assert_eq!(seen, Some(7));
    }

    #[test]
    fn unreadable_chain_exits_non_zero() {
        let args = CheckArgs {
            common: CommonArgs {
                config: None,
                token: None,
            },
            chain: vec!["/nonexistent/leaf.pem".to_string()],
            trusted: vec![],
            aaguid: None,
        };

        assert_eq!(finish(check(&args), "chain validation", |_| {}), 1);
    }
}
