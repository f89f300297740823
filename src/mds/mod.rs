// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The mds module is a client for the FIDO Alliance metadata service.
//!
//! [`MdsClient::fetch_toc_payload`] downloads the signed table of contents
//! and only returns it once its signature checks out.  Each
//! [`MetadataTOCPayloadEntry`] points at a [`MetadataStatement`] that can be
//! retrieved with [`MdsClient::fetch_statement_for`].
//!
//! # Example
//!
//! ```no_run
//! use fidotrust::http::BlockingClient;
//! use fidotrust::mds::MdsClient;
//! use std::time::Duration;
//!
//! let http = BlockingClient::new(Duration::from_secs(30)).expect("HTTP client");
//! let mds = MdsClient::new(http, "access-token");
//!
//! let toc = mds.fetch_toc_payload().expect("fetching TOC");
//!
//! for e in toc.entries().iter().filter(|e| e.url.is_some()) {
//!     let ms = mds.fetch_statement_for(e).expect("fetching statement");
//!     println!("{}", ms.description);
//! }
//! ```

pub use self::client::{MdsClient, DEFAULT_BASE_URI};
pub use self::errors::Error;
pub use self::statement::{MetadataStatement, VerificationMethodDescriptor, Version};
pub use self::toc::{
    AuthenticatorStatus, BiometricStatusReport, MetadataTOCPayload, MetadataTOCPayloadEntry,
    StatusReport,
};

mod client;
mod errors;
mod statement;
mod toc;
