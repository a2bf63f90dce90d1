//! Transports that turn a location into a readable byte stream
//!
//! A transport only opens; it never interprets bytes. That keeps fallback
//! between transports safe: once a stream is handed to the decoder, any
//! failure is final for that read.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Capability to open a sequential byte stream for a location
pub trait Transport: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Open `location` for sequential reading
    fn open(&self, location: &str) -> Result<Box<dyn Read + Send>>;
}

/// Buffered local file reads
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFile;

impl Transport for LocalFile {
    fn name(&self) -> &'static str {
        "file"
    }

    fn open(&self, location: &str) -> Result<Box<dyn Read + Send>> {
        let file = File::open(Path::new(location))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Memory-mapped local file reads
#[cfg(feature = "mmap")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MmapFile;

#[cfg(feature = "mmap")]
impl Transport for MmapFile {
    fn name(&self) -> &'static str {
        "mmap"
    }

    fn open(&self, location: &str) -> Result<Box<dyn Read + Send>> {
        let file = File::open(Path::new(location))?;
        // SAFETY: the mapping is read-only and owned by the returned reader.
        // The file must not be truncated by another process while it is read,
        // which is the same assumption a buffered reader makes about content.
        let mmap = unsafe {
            memmap2::MmapOptions::new()
                .map(&file)
                .map_err(|err| Error::Transport {
                    transport: "mmap",
                    reason: err.to_string(),
                })?
        };
        Ok(Box::new(std::io::Cursor::new(mmap)))
    }
}

/// Tries a list of transports in order until one opens the location
pub struct FallbackTransport {
    transports: Vec<Box<dyn Transport>>,
}

impl FallbackTransport {
    /// Create an empty chain
    pub fn new() -> Self {
        Self {
            transports: Vec::new(),
        }
    }

    /// Append a transport to the chain
    pub fn with(mut self, transport: impl Transport + 'static) -> Self {
        self.transports.push(Box::new(transport));
        self
    }

    /// Number of transports in the chain
    pub fn len(&self) -> usize {
        self.transports.len()
    }

    /// Whether the chain is empty
    pub fn is_empty(&self) -> bool {
        self.transports.is_empty()
    }
}

impl Default for FallbackTransport {
    /// Memory map first (when enabled), then buffered reads
    fn default() -> Self {
        let chain = Self::new();
        #[cfg(feature = "mmap")]
        let chain = chain.with(MmapFile);
        chain.with(LocalFile)
    }
}

impl Transport for FallbackTransport {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn open(&self, location: &str) -> Result<Box<dyn Read + Send>> {
        for transport in &self.transports {
            match transport.open(location) {
                Ok(reader) => {
                    debug!(transport = transport.name(), location, "opened source");
                    return Ok(reader);
                }
                Err(err) => {
                    warn!(
                        transport = transport.name(),
                        location,
                        error = %err,
                        "transport failed, trying next"
                    );
                }
            }
        }
        Err(Error::NoTransport(location.to_string()))
    }
}

#[cfg(feature = "http")]
pub mod http {
    //! HTTP download transport

    use std::io::{Cursor, Read};

    use reqwest::Client;
    use tracing::debug;

    use super::Transport;
    use crate::error::{Error, Result};

    /// Downloads the whole body before decoding starts
    ///
    /// The download runs on a private current-thread tokio runtime, so the
    /// decoder itself stays synchronous.
    #[derive(Debug, Clone, Default)]
    pub struct HttpTransport {
        client: Client,
    }

    impl HttpTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Use a preconfigured client (timeouts, auth headers, proxies)
        pub fn with_client(client: Client) -> Self {
            Self { client }
        }

        /// Fetch the full body of `url`
        pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|err| transport_error(err.to_string()))?;

            if !response.status().is_success() {
                return Err(transport_error(format!("HTTP status {}", response.status())));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|err| transport_error(err.to_string()))?;
            debug!(url, bytes = bytes.len(), "downloaded density matrix");
            Ok(bytes.to_vec())
        }
    }

    fn transport_error(reason: String) -> Error {
        Error::Transport {
            transport: "http",
            reason,
        }
    }

    impl Transport for HttpTransport {
        fn name(&self) -> &'static str {
            "http"
        }

        fn open(&self, location: &str) -> Result<Box<dyn Read + Send>> {
            if !(location.starts_with("http://") || location.starts_with("https://")) {
                return Err(transport_error(format!("not an http(s) URL: {location}")));
            }
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let body = runtime.block_on(self.fetch(location))?;
            Ok(Box::new(Cursor::new(body)))
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Failing;

    impl Transport for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn open(&self, _location: &str) -> Result<Box<dyn Read + Send>> {
            Err(Error::Transport {
                transport: "failing",
                reason: "unreachable host".to_string(),
            })
        }
    }

    struct Fixed(Vec<u8>);

    impl Transport for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn open(&self, _location: &str) -> Result<Box<dyn Read + Send>> {
            Ok(Box::new(Cursor::new(self.0.clone())))
        }
    }

    #[test]
    fn test_fallback_uses_first_working_transport() {
        let chain = FallbackTransport::new()
            .with(Failing)
            .with(Fixed(vec![7, 8, 9]));
        let mut reader = chain.open("anywhere").unwrap();
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, vec![7, 8, 9]);
    }

    #[test]
    fn test_fallback_exhausted() {
        let chain = FallbackTransport::new().with(Failing);
        assert!(matches!(
            chain.open("anywhere"),
            Err(Error::NoTransport(location)) if location == "anywhere"
        ));
    }

    #[test]
    fn test_local_file_missing() {
        assert!(matches!(
            LocalFile.open("/definitely/not/here/aiida.DM"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_default_chain() {
        let chain = FallbackTransport::default();
        assert!(!chain.is_empty());
        #[cfg(feature = "mmap")]
        assert_eq!(chain.len(), 2);
    }
}
